use crate::errors::AppResult;
use crate::models::{DashboardDocument, HabitTile, ImageRef, ImageRole};
use crate::render::heatmap::HEATMAP_FILE;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub const DASHBOARD_FILE: &str = "dashboard.html";
pub const WORDCLOUD_FILE: &str = "wordclouds.png";

const STYLE: &str = r#"    .aux-item img {
      width: 100%;
      margin-bottom: 10px;
    }
    .grid-container {
      display: grid;
      grid-template-columns: repeat(4, 1fr);
      gap: 10px;
    }
    .grid-item img {
      width: 100%;
      border: 1px solid #ddd;
      border-radius: 4px;
      padding: 5px;
    }
    .grid-item {
      text-align: center;
      font-family: Arial, sans-serif;
      font-size: 14px;
    }
"#;

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn image_ref(role: ImageRole, path: &Path, alt: &str) -> ImageRef {
    ImageRef {
        role,
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        alt: alt.to_string(),
    }
}

pub fn collect_images(output_dir: &Path, tiles: &[HabitTile]) -> Vec<ImageRef> {
    let mut images = Vec::with_capacity(tiles.len() + 2);
    for (role, file_name, alt) in [
        (ImageRole::WordCloud, WORDCLOUD_FILE, "Word clouds"),
        (ImageRole::Heatmap, HEATMAP_FILE, "Heatmap"),
    ] {
        let path = output_dir.join(file_name);
        if path.is_file() {
            images.push(image_ref(role, &path, alt));
        }
    }

    let mut ordered: Vec<&HabitTile> = tiles.iter().filter(|tile| tile.image.is_file()).collect();
    ordered.sort_by(|a, b| b.name.cmp(&a.name));
    images.extend(
        ordered
            .into_iter()
            .map(|tile| image_ref(ImageRole::Tile, &tile.image, &tile.name)),
    );
    images
}

pub fn render_html(images: &[ImageRef]) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  <style>\n");
    html.push_str(STYLE);
    html.push_str("  </style>\n</head>\n<body>\n");

    for image in images.iter().filter(|image| image.role != ImageRole::Tile) {
        let _ = writeln!(
            html,
            "  <div class=\"aux-item\"><img src=\"{}\" alt=\"{}\"></div>",
            escape_html(&image.file_name),
            escape_html(&image.alt)
        );
    }

    html.push_str("  <div class=\"grid-container\">\n");
    for image in images.iter().filter(|image| image.role == ImageRole::Tile) {
        let _ = writeln!(
            html,
            "    <div class=\"grid-item\"><img src=\"{}\" alt=\"{}\"></div>",
            escape_html(&image.file_name),
            escape_html(&image.alt)
        );
    }
    html.push_str("  </div>\n</body>\n</html>\n");
    html
}

pub fn compose(output_dir: &Path, tiles: &[HabitTile]) -> AppResult<DashboardDocument> {
    let images = collect_images(output_dir, tiles);
    let html = render_html(&images);
    std::fs::create_dir_all(output_dir)?;
    let path: PathBuf = output_dir.join(DASHBOARD_FILE);
    std::fs::write(&path, &html)?;
    tracing::info!(images = images.len(), path = %path.display(), "composed dashboard");
    Ok(DashboardDocument { images, html, path })
}

#[cfg(test)]
mod tests {
    use super::{compose, escape_html, HEATMAP_FILE, WORDCLOUD_FILE};
    use crate::models::{HabitTile, ImageRole};
    use std::path::Path;

    fn tile(dir: &Path, name: &str) -> HabitTile {
        let image = dir.join(format!("{name}.png"));
        std::fs::write(&image, b"png").expect("write tile");
        HabitTile {
            name: name.to_string(),
            weeks: Vec::new(),
            trend: vec![0.0, 1.0],
            current: 1.0,
            previous: 0.0,
            image,
        }
    }

    #[test]
    fn five_tiles_fill_four_column_grid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tiles: Vec<HabitTile> = ["Bike", "Read", "No alcohol", "Track sleep", "Meditate"]
            .iter()
            .map(|name| tile(dir.path(), name))
            .collect();

        let doc = compose(dir.path(), &tiles).expect("compose");
        let names: Vec<&str> = doc.images.iter().map(|image| image.alt.as_str()).collect();
        assert_eq!(names, vec!["Track sleep", "Read", "No alcohol", "Meditate", "Bike"]);

        assert!(doc.html.contains("grid-template-columns: repeat(4, 1fr)"));
        assert_eq!(doc.html.matches("class=\"grid-container\"").count(), 1);
        let grid_open = doc.html.find("<div class=\"grid-container\">").expect("grid");
        let grid_close = doc.html.rfind("</div>\n</body>").expect("grid end");
        let grid = &doc.html[grid_open..grid_close];
        assert_eq!(grid.matches("class=\"grid-item\"").count(), 5);
        assert_eq!(doc.html.matches("class=\"grid-item\"").count(), 5);
        assert_eq!(std::fs::read_to_string(&doc.path).expect("html"), doc.html);
    }

    #[test]
    fn auxiliary_images_come_first_when_present() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(HEATMAP_FILE), b"png").expect("heatmap");
        std::fs::write(dir.path().join(WORDCLOUD_FILE), b"png").expect("wordcloud");
        let tiles = vec![tile(dir.path(), "Read")];

        let doc = compose(dir.path(), &tiles).expect("compose");
        let roles: Vec<ImageRole> = doc.images.iter().map(|image| image.role.clone()).collect();
        assert_eq!(roles, vec![ImageRole::WordCloud, ImageRole::Heatmap, ImageRole::Tile]);

        let cloud_at = doc.html.find(WORDCLOUD_FILE).expect("cloud ref");
        let grid_at = doc.html.find("grid-container\">").expect("grid");
        assert!(cloud_at < grid_at);
    }

    #[test]
    fn missing_tile_files_are_not_referenced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ghost = tile(dir.path(), "Ghost");
        std::fs::remove_file(&ghost.image).expect("remove");
        let doc = compose(dir.path(), &[ghost]).expect("compose");
        assert!(doc.images.is_empty());
    }

    #[test]
    fn escapes_attribute_text() {
        assert_eq!(escape_html("Rock & \"Roll\""), "Rock &amp; &quot;Roll&quot;");
    }
}
