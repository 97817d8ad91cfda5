//! Tunable constants of the governor.
//!
//! Settings are stored as a JSON document which may contain `//` line comments and `/* */` block comments,
//! the same format game rule files use. The default document is bundled in `jsons/OptimiserSettings.json`.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::output::{CommerceSplit, PlotYield, TotalOutput};

/// Errors raised while loading [`OptimiserSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("can't read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("can't parse settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings field `{field}` has invalid value {value}")]
    InvalidValue { field: &'static str, value: i64 },
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimiserSettings {
    /// The food one citizen eats each turn, scaled by 100.
    pub food_per_population: i32,
    /// When a city grows fast, the food target is raised by `excess / major_growth_divisor` whole food units.
    pub major_growth_divisor: i32,
    /// When a city grows slowly, the food target is raised by `excess / minor_growth_divisor` whole food units.
    pub minor_growth_divisor: i32,
    /// Juggling is skipped when the city has fewer workable plots than this.
    pub min_juggling_items: usize,
    /// Juggling is skipped when the city has fewer working citizens than this.
    pub min_juggling_population: i32,
    /// The weights used when the caller doesn't provide a value functor.
    pub default_weights: TotalOutput,
    /// The weights used by the dot map when the caller doesn't provide a yield functor.
    pub default_yield_weights: PlotYield,
    pub commerce_split: CommerceSplit,
}

impl Default for OptimiserSettings {
    fn default() -> Self {
        Self {
            food_per_population: 200,
            major_growth_divisor: 200,
            minor_growth_divisor: 400,
            min_juggling_items: 4,
            min_juggling_population: 2,
            default_weights: TotalOutput::new(3, 2, 1, 1, 1, 1),
            default_yield_weights: PlotYield::new(3, 2, 1),
            commerce_split: CommerceSplit::default(),
        }
    }
}

impl OptimiserSettings {
    /// Loads the settings bundled with the crate.
    pub fn bundled() -> Result<Self, SettingsError> {
        Self::from_json_str(include_str!("../jsons/OptimiserSettings.json"))
    }

    /// Loads settings from a file. The file may contain comments.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json_string_with_comment = fs::read_to_string(path)?;
        Self::from_json_str(&json_string_with_comment)
    }

    /// Parses settings from a JSON string which may contain comments. Missing fields take their default value.
    pub fn from_json_str(json_with_comments: &str) -> Result<Self, SettingsError> {
        let json_string_without_comment = strip_json_comments(json_with_comments, true);
        let settings: Self = serde_json::from_str(&json_string_without_comment)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let positive_fields = [
            ("foodPerPopulation", self.food_per_population),
            ("majorGrowthDivisor", self.major_growth_divisor),
            ("minorGrowthDivisor", self.minor_growth_divisor),
        ];
        for (field, value) in positive_fields {
            if value <= 0 {
                return Err(SettingsError::InvalidValue {
                    field,
                    value: value as i64,
                });
            }
        }
        Ok(())
    }
}

/// Takes a JSON string with comments and returns the version without comments,
/// which can be parsed by serde_json as a standard JSON string.
///
/// Supports line comments (`//...`) and nested block comments (`/*...*/`).
/// When `preserve_locations` is true every comment character is replaced by a space (newlines are kept),
/// so that JSON parsing errors point to the right line and column.
pub fn strip_json_comments(json_with_comments: &str, preserve_locations: bool) -> String {
    let mut json_without_comments = String::with_capacity(json_with_comments.len());

    let mut block_comment_depth: u32 = 0;
    let mut is_in_line_comment = false;
    // Comments cannot start inside strings.
    let mut is_in_string = false;
    let mut is_escaped = false;

    let blank = |output: &mut String, count: usize| {
        if preserve_locations {
            output.extend(std::iter::repeat_n(' ', count));
        }
    };

    let mut chars = json_with_comments.chars().peekable();
    while let Some(cur_char) = chars.next() {
        if is_in_line_comment {
            if cur_char == '\n' {
                is_in_line_comment = false;
                json_without_comments.push('\n');
            } else {
                blank(&mut json_without_comments, 1);
            }
            continue;
        }

        if block_comment_depth > 0 {
            match (cur_char, chars.peek()) {
                ('*', Some('/')) => {
                    chars.next();
                    block_comment_depth -= 1;
                    blank(&mut json_without_comments, 2);
                }
                ('/', Some('*')) => {
                    chars.next();
                    block_comment_depth += 1;
                    blank(&mut json_without_comments, 2);
                }
                ('\n', _) => json_without_comments.push('\n'),
                _ => blank(&mut json_without_comments, 1),
            }
            continue;
        }

        if is_in_string {
            if is_escaped {
                is_escaped = false;
            } else if cur_char == '\\' {
                is_escaped = true;
            } else if cur_char == '"' {
                is_in_string = false;
            }
            json_without_comments.push(cur_char);
            continue;
        }

        match (cur_char, chars.peek()) {
            ('"', _) => {
                is_in_string = true;
                json_without_comments.push(cur_char);
            }
            ('/', Some('/')) => {
                chars.next();
                is_in_line_comment = true;
                blank(&mut json_without_comments, 2);
            }
            ('/', Some('*')) => {
                chars.next();
                block_comment_depth += 1;
                blank(&mut json_without_comments, 2);
            }
            _ => json_without_comments.push(cur_char),
        }
    }

    json_without_comments
}
