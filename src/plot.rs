//! The data needed to graph a line of working. Actually drawing the graph is
//! left to the caller.

use crate::{
    algebra::{
        ops::{self, Builtins, Context},
        parse_statement, roots, to_latex, Expression, Fraction, Number, Parameter,
        Statement,
    },
    equations::Equation,
    extract::{split_clauses, ExtractionError},
    normalize::normalize,
};

/// The window a graph is drawn in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlotOptions {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    /// How many points to sample along each curve.
    pub samples: usize,
}

impl PlotOptions {
    fn x_values(&self) -> impl Iterator<Item = f64> + '_ {
        linspace(self.x_min, self.x_max, self.samples)
    }

    fn y_values(&self) -> impl Iterator<Item = f64> + '_ {
        linspace(self.y_min, self.y_max, self.samples)
    }
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            x_min: -10.0,
            x_max: 10.0,
            y_min: -10.0,
            y_max: 10.0,
            samples: 400,
        }
    }
}

fn linspace(start: f64, end: f64, count: usize) -> impl Iterator<Item = f64> {
    let step = if count > 1 {
        (end - start) / (count - 1) as f64
    } else {
        0.0
    };

    (0..count).map(move |i| start + step * i as f64)
}

/// Something which can be drawn on a graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    /// `y = f(x)`.
    Graph { label: String, function: Expression },
    /// The vertical line `x = c`.
    Vertical { label: String, x: f64 },
}

impl Curve {
    /// The equation this curve came from, as LaTeX.
    pub fn label(&self) -> &str {
        match self {
            Curve::Graph { label, .. } | Curve::Vertical { label, .. } => label,
        }
    }

    pub fn sample(&self, options: &PlotOptions) -> Vec<(f64, f64)> {
        self.sample_with(options, &Builtins)
    }

    /// Evaluate the curve across the window, skipping any points which
    /// aren't real and finite.
    pub fn sample_with<C: Context>(
        &self,
        options: &PlotOptions,
        ctx: &C,
    ) -> Vec<(f64, f64)> {
        match self {
            Curve::Graph { function, .. } => options
                .x_values()
                .filter_map(|x| {
                    let lookup = |_: &Parameter| Some(Number::float(x));
                    let y = ops::evaluate(function, &lookup, ctx).ok()?.to_f64()?;

                    if y.is_finite() {
                        Some((x, y))
                    } else {
                        None
                    }
                })
                .collect(),
            Curve::Vertical { x, .. } => options.y_values().map(|y| (*x, y)).collect(),
        }
    }
}

/// Find the curves for each equation in a raw line of input.
pub fn curves(raw: &str) -> Result<Vec<Curve>, ExtractionError> {
    curves_with(&normalize(raw), &Builtins)
}

/// Find the curves for each equation in an already normalized line.
///
/// Equations which are linear in `y` become `y = f(x)`, and equations in `x`
/// alone become a vertical line at each real root. Anything else is skipped.
pub fn curves_with<C: Context>(
    normalized: &str,
    ctx: &C,
) -> Result<Vec<Curve>, ExtractionError> {
    let x = Parameter::named("x");
    let y = Parameter::named("y");
    let mut curves = Vec::new();

    for clause in split_clauses(normalized) {
        let equation = match parse_statement(clause)? {
            Statement::Equation(equation) => equation,
            Statement::Expression(expr) => Equation::equal_to_zero(expr),
            _ => continue,
        };
        let label = to_latex(&Statement::Equation(equation.clone()));

        let numerator = match Fraction::from_expression(&equation.body(), ctx) {
            Ok(fraction) => fraction.numerator,
            Err(e) => {
                log::debug!("Unable to plot \"{}\": {}", equation, e);
                continue;
            },
        };

        if numerator.degree_in(&y) == 1 {
            // a*y + b = 0, so y = -b/a
            let coefficients = numerator.coefficients_in(&y);
            let function = -coefficients[0].to_expression()
                / coefficients[1].to_expression();

            curves.push(Curve::Graph {
                label,
                function: ops::fold_constants(&function, ctx),
            });
        } else if numerator.variables() == [x.clone()] {
            let coefficients = match numerator.univariate_coefficients(&x) {
                Some(coefficients) => coefficients,
                None => continue,
            };

            for root in roots::roots(&coefficients)? {
                if let Some(value) = root.to_f64() {
                    curves.push(Curve::Vertical {
                        label: label.clone(),
                        x: value,
                    });
                }
            }
        }
    }

    Ok(curves)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_of_a_linear_system() {
        let got = curves("2x + 3y = 20; x + y = 8").unwrap();

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].label(), "2 x + 3 y = 20");

        let options = PlotOptions {
            x_min: 1.0,
            x_max: 4.0,
            samples: 2,
            ..PlotOptions::default()
        };
        assert_eq!(got[0].sample(&options), vec![(1.0, 6.0), (4.0, 4.0)]);
        assert_eq!(got[1].sample(&options), vec![(1.0, 7.0), (4.0, 4.0)]);
    }

    #[test]
    fn equations_in_x_are_vertical_lines() {
        let got = curves("x^2 = 4").unwrap();

        let mut xs: Vec<f64> = got
            .iter()
            .filter_map(|curve| match curve {
                Curve::Vertical { x, .. } => Some(*x),
                _ => None,
            })
            .collect();
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(xs, vec![-2.0, 2.0]);
    }

    #[test]
    fn complex_roots_cant_be_plotted() {
        let got = curves("x^2 + 4 = 0").unwrap();

        assert!(got.is_empty());
    }

    #[test]
    fn sampling_skips_undefined_points() {
        let got = curves("y = 1/x").unwrap();

        let options = PlotOptions {
            x_min: -1.0,
            x_max: 1.0,
            samples: 3,
            ..PlotOptions::default()
        };
        assert_eq!(got[0].sample(&options), vec![(-1.0, -1.0), (1.0, 1.0)]);
    }

    #[test]
    fn default_window() {
        let options = PlotOptions::default();
        let vertical = Curve::Vertical {
            label: String::from("x = 3"),
            x: 3.0,
        };

        let points = vertical.sample(&options);

        assert_eq!(points.len(), 400);
        assert_eq!(points[0], (3.0, -10.0));
        assert_eq!(points[399], (3.0, 10.0));
    }
}
