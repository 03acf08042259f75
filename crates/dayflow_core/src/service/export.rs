//! Month grid export.
//!
//! # Responsibility
//! - Project one month into a Sunday-first calendar grid with tasks or the
//!   note of each day.
//! - Render the grid to a PNG raster for download/sharing.
//!
//! # Invariants
//! - Every in-month day appears in exactly one cell; padding cells are
//!   `None`.
//! - Rendering is deterministic for the same grid.

use crate::model::date::{DateKey, MonthKey};
use crate::model::note::DailyNotes;
use crate::model::task::Task;
use crate::service::projection::Progress;
use image::{ImageFormat, Rgb, RgbImage};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Cursor;
use std::path::Path;

pub const CELL_SIZE: u32 = 48;
pub const CELL_GAP: u32 = 4;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const EMPTY_DAY: Rgb<u8> = Rgb([226, 232, 240]);
const NOTE_ONLY_DAY: Rgb<u8> = Rgb([251, 191, 36]);
const INCOMPLETE: [u8; 3] = [203, 213, 225];
const COMPLETE: [u8; 3] = [59, 130, 246];

#[derive(Debug)]
pub enum ExportError {
    Encode(String),
    Io(std::io::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(message) => write!(f, "month image encoding failed: {message}"),
            Self::Io(err) => write!(f, "month image write failed: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Encode(_) => None,
        }
    }
}

impl From<image::ImageError> for ExportError {
    fn from(value: image::ImageError) -> Self {
        Self::Encode(value.to_string())
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTask {
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    pub date: DateKey,
    pub tasks: Vec<GridTask>,
    pub note: Option<String>,
}

impl GridCell {
    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.tasks.iter().filter(|task| task.completed).count(),
            total: self.tasks.len(),
        }
    }
}

pub type GridWeek = [Option<GridCell>; 7];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub month: MonthKey,
    pub weeks: Vec<GridWeek>,
}

impl MonthGrid {
    /// Cell position `(week, weekday)` of `date`, Sunday = 0.
    pub fn position_of(&self, date: &DateKey) -> Option<(usize, usize)> {
        self.weeks.iter().enumerate().find_map(|(row, week)| {
            week.iter()
                .position(|cell| cell.as_ref().is_some_and(|cell| cell.date == *date))
                .map(|column| (row, column))
        })
    }
}

/// Builds the calendar grid of `month`.
pub fn month_grid(tasks: &[Task], notes: &DailyNotes, month: &MonthKey) -> MonthGrid {
    let mut weeks: Vec<GridWeek> = Vec::new();
    let mut week: GridWeek = Default::default();
    let mut column = month.first_day().weekday().num_days_from_sunday() as usize;

    for date in month.days() {
        let cell = GridCell {
            tasks: tasks
                .iter()
                .filter(|task| task.date == date)
                .map(|task| GridTask {
                    text: task.text.clone(),
                    completed: task.completed,
                })
                .collect(),
            note: notes.get(&date).cloned(),
            date,
        };
        week[column] = Some(cell);
        column += 1;
        if column == 7 {
            weeks.push(std::mem::take(&mut week));
            column = 0;
        }
    }
    if column > 0 {
        weeks.push(week);
    }

    MonthGrid {
        month: month.clone(),
        weeks,
    }
}

/// Fill color of one cell.
pub fn cell_color(cell: Option<&GridCell>) -> Rgb<u8> {
    let Some(cell) = cell else {
        return BACKGROUND;
    };
    let progress = cell.progress();
    if progress.total == 0 {
        return if cell.note.is_some() {
            NOTE_ONLY_DAY
        } else {
            EMPTY_DAY
        };
    }
    let ratio = progress.percent() / 100.0;
    let mix = |from: u8, to: u8| -> u8 {
        (f64::from(from) + (f64::from(to) - f64::from(from)) * ratio).round() as u8
    };
    Rgb([
        mix(INCOMPLETE[0], COMPLETE[0]),
        mix(INCOMPLETE[1], COMPLETE[1]),
        mix(INCOMPLETE[2], COMPLETE[2]),
    ])
}

/// Top-left pixel of cell `(row, column)`.
pub fn cell_origin(row: usize, column: usize) -> (u32, u32) {
    let step = CELL_SIZE + CELL_GAP;
    (
        CELL_GAP + column as u32 * step,
        CELL_GAP + row as u32 * step,
    )
}

/// Renders the grid into an RGB raster.
pub fn render_month_image(grid: &MonthGrid) -> RgbImage {
    let rows = grid.weeks.len().max(1) as u32;
    let width = 7 * CELL_SIZE + 8 * CELL_GAP;
    let height = rows * CELL_SIZE + (rows + 1) * CELL_GAP;
    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

    for (row, week) in grid.weeks.iter().enumerate() {
        for (column, cell) in week.iter().enumerate() {
            let color = cell_color(cell.as_ref());
            let (left, top) = cell_origin(row, column);
            for y in top..top + CELL_SIZE {
                for x in left..left + CELL_SIZE {
                    image.put_pixel(x, y, color);
                }
            }
        }
    }
    image
}

/// Renders the grid and encodes it as PNG bytes.
pub fn render_month_png(grid: &MonthGrid) -> Result<Vec<u8>, ExportError> {
    let image = render_month_image(grid);
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Writes the PNG export to `path`.
pub fn save_month_png(grid: &MonthGrid, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let bytes = render_month_png(grid)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{cell_color, cell_origin, month_grid, render_month_png, CELL_SIZE, EMPTY_DAY, NOTE_ONLY_DAY};
    use crate::model::date::{DateKey, MonthKey};
    use crate::model::note::DailyNotes;
    use crate::model::task::Task;

    fn day(value: &str) -> DateKey {
        DateKey::parse(value).unwrap()
    }

    #[test]
    fn grid_starts_on_correct_weekday() {
        // 2024-06-01 is a Saturday.
        let grid = month_grid(&[], &DailyNotes::new(), &MonthKey::parse("2024-06").unwrap());
        assert_eq!(grid.position_of(&day("2024-06-01")), Some((0, 6)));
        assert_eq!(grid.position_of(&day("2024-06-02")), Some((1, 0)));
        assert_eq!(grid.position_of(&day("2024-06-30")), Some((5, 0)));
        assert_eq!(grid.weeks.len(), 6);
        let cells = grid.weeks.iter().flatten().flatten().count();
        assert_eq!(cells, 30);
    }

    #[test]
    fn colors_reflect_tasks_and_notes() {
        let mut done = Task::new(day("2024-06-03"), false, "run").unwrap();
        done.completed = true;
        let mut notes = DailyNotes::new();
        notes.insert(day("2024-06-04"), "rest".to_string());
        let grid = month_grid(&[done], &notes, &MonthKey::parse("2024-06").unwrap());

        let cell_at = |date: &str| {
            let (row, column) = grid.position_of(&day(date)).unwrap();
            grid.weeks[row][column].clone()
        };
        assert_eq!(cell_color(cell_at("2024-06-03").as_ref()).0, [59, 130, 246]);
        assert_eq!(cell_color(cell_at("2024-06-04").as_ref()), NOTE_ONLY_DAY);
        assert_eq!(cell_color(cell_at("2024-06-05").as_ref()), EMPTY_DAY);
    }

    #[test]
    fn png_decodes_with_expected_cell_pixels() {
        let mut notes = DailyNotes::new();
        notes.insert(day("2024-06-01"), "first".to_string());
        let grid = month_grid(&[], &notes, &MonthKey::parse("2024-06").unwrap());
        let bytes = render_month_png(&grid).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();

        let (left, top) = cell_origin(0, 6);
        let center = decoded.get_pixel(left + CELL_SIZE / 2, top + CELL_SIZE / 2);
        assert_eq!(*center, NOTE_ONLY_DAY);
    }
}
