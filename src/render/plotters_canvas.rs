use super::heatmap::Heatmap;
use super::{TileCanvas, TileSpec, Tone};
use crate::errors::{AppError, AppResult};
use chrono::Duration;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

const FONT: &str = "sans-serif";
const LINE_COLOR: RGBColor = RGBColor(0x1F, 0x77, 0xB4);
const FAVORABLE_COLOR: RGBColor = RGBColor(0x3D, 0x99, 0x70);
const UNFAVORABLE_COLOR: RGBColor = RGBColor(0xFF, 0x41, 0x36);
const NEUTRAL_COLOR: RGBColor = RGBColor(0x88, 0x88, 0x88);
const GRID_COLOR: RGBColor = RGBColor(200, 200, 200);
const HEAT_LOW: RGBColor = RGBColor(0xF7, 0xFB, 0xF4);
const HEAT_HIGH: RGBColor = RGBColor(0x06, 0x77, 0x64);
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, Copy)]
pub struct PlottersCanvas {
    pub width: u32,
    pub height: u32,
}

impl Default for PlottersCanvas {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
        }
    }
}

fn render_err(error: impl std::fmt::Display) -> AppError {
    AppError::Render(error.to_string())
}

fn tone_color(tone: Tone) -> RGBColor {
    match tone {
        Tone::Favorable => FAVORABLE_COLOR,
        Tone::Unfavorable => UNFAVORABLE_COLOR,
        Tone::Neutral => NEUTRAL_COLOR,
    }
}

fn heat_color(value: f64) -> RGBColor {
    let t = value.clamp(0.0, 1.0);
    let mix = |low: u8, high: u8| (f64::from(low) + (f64::from(high) - f64::from(low)) * t).round() as u8;
    RGBColor(
        mix(HEAT_LOW.0, HEAT_HIGH.0),
        mix(HEAT_LOW.1, HEAT_HIGH.1),
        mix(HEAT_LOW.2, HEAT_HIGH.2),
    )
}

impl TileCanvas for PlottersCanvas {
    fn draw_tile(&self, spec: &TileSpec, path: &Path) -> AppResult<()> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let body = root.titled(&spec.title, (FONT, 40)).map_err(render_err)?;
        let (width, height) = body.dim_in_pixel();
        let (upper, lower) = body.split_vertically((height / 2) as i32);

        let centered = Pos::new(HPos::Center, VPos::Center);
        let center_x = (width / 2) as i32;
        let upper_height = (height / 2) as i32;
        upper
            .draw(&Text::new(
                spec.value_text.clone(),
                (center_x, upper_height * 2 / 5),
                (FONT, 72).into_font().color(&BLACK).pos(centered),
            ))
            .map_err(render_err)?;
        upper
            .draw(&Text::new(
                spec.delta.text.clone(),
                (center_x, upper_height * 4 / 5),
                (FONT, 32).into_font().color(&tone_color(spec.delta.tone)).pos(centered),
            ))
            .map_err(render_err)?;

        let first = spec.weeks[0] - Duration::days(3);
        let last = spec.weeks[spec.weeks.len() - 1] + Duration::days(3);
        let (y_low, y_high) = spec.y_range;
        let format = spec.format;

        let mut chart = ChartBuilder::on(&lower)
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(first..last, y_low..y_high)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_max_light_lines(0)
            .bold_line_style(GRID_COLOR.mix(0.5))
            .x_labels(spec.weeks.len())
            .x_label_formatter(&|day| day.format("%m-%d").to_string())
            .y_labels(5)
            .y_label_formatter(&|value| format.format(*value))
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(spec.gridlines.iter().map(|week| {
                PathElement::new(vec![(*week, y_low), (*week, y_high)], GRID_COLOR.mix(0.5).stroke_width(1))
            }))
            .map_err(render_err)?;

        let points: Vec<_> = spec.weeks.iter().copied().zip(spec.trend.iter().copied()).collect();
        chart
            .draw_series(LineSeries::new(points.clone(), LINE_COLOR.stroke_width(2)))
            .map_err(render_err)?;
        chart
            .draw_series(points.into_iter().map(|point| Circle::new(point, 4, LINE_COLOR.filled())))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(())
    }

    fn draw_heatmap(&self, heatmap: &Heatmap, path: &Path) -> AppResult<()> {
        let root = BitMapBackend::new(path, (self.width * 2, self.height / 2)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let body = root.titled("Daily completion", (FONT, 28)).map_err(render_err)?;

        let week_count = heatmap.weeks.len() as i32;
        let mut chart = ChartBuilder::on(&body)
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(0..week_count, 0..7i32)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(heatmap.weeks.len())
            .x_label_formatter(&|index| {
                heatmap
                    .weeks
                    .get(*index as usize)
                    .map(|week| week.format("%m-%d").to_string())
                    .unwrap_or_default()
            })
            .y_labels(7)
            .y_label_formatter(&|index| WEEKDAYS.get(*index as usize).copied().unwrap_or_default().to_string())
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(heatmap.cells.iter().map(|cell| {
                let x = cell.week as i32;
                let y = cell.weekday as i32;
                Rectangle::new([(x, y), (x + 1, y + 1)], heat_color(cell.value).filled())
            }))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
        Ok(())
    }
}
