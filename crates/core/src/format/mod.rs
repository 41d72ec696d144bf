//! Textual rendering of individual values.
//!
//! Every wrapper here implements [`fmt::Display`] so that the exporter can
//! stream values straight into its output buffer. The rules are recursive:
//! vectors and matrices format their elements with the scalar rules.

use std::fmt::{self, Display, Write};

use crate::{Matrix, Real, StereoSample, Value};

/// Renders a real: integral values lose their fractional part, all other
/// values use the shortest text that parses back to the same `f32`.
#[derive(Debug, Clone, Copy)]
pub struct DisplayReal(pub Real);

impl Display for DisplayReal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value.is_nan() {
            f.write_str(".nan")
        } else if value.is_infinite() {
            f.write_str(if value > 0.0 { ".inf" } else { "-.inf" })
        } else {
            // `Display` for floats never prints a trailing `.0`.
            write!(f, "{value}")
        }
    }
}

/// Renders a string in double quotes with embedded quotes escaped.
#[derive(Debug, Clone, Copy)]
pub struct DisplayString<'a>(pub &'a str);

impl Display for DisplayString<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        for ch in self.0.chars() {
            if ch == '"' {
                f.write_char('\\')?;
            }
            f.write_char(ch)?;
        }
        f.write_char('"')
    }
}

/// Renders a single value of any kind.
#[derive(Debug, Clone, Copy)]
pub struct DisplayValue<'a>(pub &'a Value);

impl Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Real(value) => Display::fmt(&DisplayReal(*value), f),
            Value::String(value) => Display::fmt(&DisplayString(value), f),
            Value::RealVector(values) => write_list(f, values.iter().copied().map(DisplayReal)),
            Value::StringVector(values) => {
                write_list(f, values.iter().map(|value| DisplayString(value)))
            }
            Value::Matrix(matrix) => write_matrix(f, matrix),
            Value::StereoSample(sample) => write_stereo(f, sample),
        }
    }
}

/// Renders the values accumulated under one key as a bracketed list.
#[derive(Debug, Clone, Copy)]
pub struct DisplaySeries<'a>(pub &'a [Value]);

impl Display for DisplaySeries<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, self.0.iter().map(DisplayValue))
    }
}

fn write_list<I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator,
    I::Item: Display,
{
    f.write_char('[')?;
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        Display::fmt(&item, f)?;
    }
    f.write_char(']')
}

fn write_matrix(f: &mut fmt::Formatter<'_>, matrix: &Matrix) -> fmt::Result {
    write_list(f, matrix.row_iter().map(RowDisplay))
}

struct RowDisplay<'a>(&'a [Real]);

impl Display for RowDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, self.0.iter().copied().map(DisplayReal))
    }
}

fn write_stereo(f: &mut fmt::Formatter<'_>, sample: &StereoSample) -> fmt::Result {
    write!(
        f,
        "{{left: {}, right: {}}}",
        DisplayReal(sample.left),
        DisplayReal(sample.right)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(value: impl Into<Value>) -> String {
        DisplayValue(&value.into()).to_string()
    }

    #[test]
    fn integral_reals_drop_the_fraction() {
        assert_eq!(DisplayReal(1.0).to_string(), "1");
        assert_eq!(DisplayReal(-1.0).to_string(), "-1");
        assert_eq!(DisplayReal(2008.0).to_string(), "2008");
        assert_eq!(DisplayReal(0.0).to_string(), "0");
    }

    #[test]
    fn fractional_reals_round_trip() {
        for value in [3.145_f32, -0.456, 1.0e-5, 123.456] {
            let text = DisplayReal(value).to_string();
            assert_eq!(text.parse::<f32>().unwrap(), value, "{text}");
        }
    }

    #[test]
    fn non_finite_reals_use_yaml_spelling() {
        assert_eq!(DisplayReal(Real::NAN).to_string(), ".nan");
        assert_eq!(DisplayReal(Real::INFINITY).to_string(), ".inf");
        assert_eq!(DisplayReal(Real::NEG_INFINITY).to_string(), "-.inf");
    }

    #[test]
    fn strings_are_quoted_and_escaped() {
        assert_eq!(render("foo"), "\"foo\"");
        assert_eq!(render("\"\""), r#""\"\"""#);
        assert_eq!(render(""), "\"\"");
    }

    #[test]
    fn vectors_use_comma_space() {
        assert_eq!(render(vec![3.0_f32, 4.0, 5.0]), "[3, 4, 5]");
        assert_eq!(
            render(vec!["ubuntu", "8.10", "released!"]),
            r#"["ubuntu", "8.10", "released!"]"#
        );
        assert_eq!(render(Vec::<Real>::new()), "[]");
    }

    #[test]
    fn matrices_render_row_by_row() {
        assert_eq!(render(Matrix::filled(2, 2, 1.0)), "[[1, 1], [1, 1]]");
        let matrix = Matrix::from_rows(vec![vec![0.5, 2.0, 3.0]]).unwrap();
        assert_eq!(render(matrix), "[[0.5, 2, 3]]");
    }

    #[test]
    fn stereo_samples_are_inline_maps() {
        assert_eq!(render((3.0_f32, 6.0_f32)), "{left: 3, right: 6}");
        assert_eq!(render((-1.0_f32, 0.25_f32)), "{left: -1, right: 0.25}");
    }

    #[test]
    fn series_are_bracketed() {
        let series = [Value::from(Matrix::filled(2, 2, 1.0))];
        assert_eq!(DisplaySeries(&series).to_string(), "[[[1, 1], [1, 1]]]");

        let pairs = [Value::from((3.0_f32, 6.0_f32)), Value::from((-1.0_f32, 2.0_f32))];
        assert_eq!(
            DisplaySeries(&pairs).to_string(),
            "[{left: 3, right: 6}, {left: -1, right: 2}]"
        );
    }
}
