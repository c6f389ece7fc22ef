use polars::prelude::*;

use super::flow_writer::FlowReading;
use super::FdvError;

/// Reads a column as nullable `f64`, or `None` when the frame lacks it.
fn float_column(df: &DataFrame, column: &str) -> Result<Option<Vec<Option<f64>>>, FdvError> {
    if df.column(column).is_err() {
        return Ok(None);
    }
    let series = df.column(column)?.cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(Some(values))
}

fn depth_is_millimetres(column: &str) -> bool {
    let lower = column.to_lowercase();
    lower.contains("mm") && !lower.contains("level")
}

/// Pairs depth and velocity rows for the flow writer.
///
/// A missing column is reported and read as 0.0 throughout; its rows are
/// not counted as nulls by the writer.
pub fn flow_readings(
    df: &DataFrame,
    depth_column: &str,
    velocity_column: Option<&str>,
) -> Result<Vec<FlowReading>, FdvError> {
    let rows = df.height();

    let depths = match float_column(df, depth_column)? {
        Some(values) if depth_is_millimetres(depth_column) => {
            log::info!("Converting depth column '{}' from mm to m", depth_column);
            values.into_iter().map(|v| v.map(|mm| mm / 1000.0)).collect()
        }
        Some(values) => values,
        None => {
            log::error!("Depth column '{}' not found. Using 0.0 for depth values.", depth_column);
            vec![Some(0.0); rows]
        }
    };

    let velocities = match velocity_column {
        Some(column) => float_column(df, column)?.unwrap_or_else(|| {
            log::error!("Velocity column '{}' not found. Using 0.0 for velocity values.", column);
            vec![Some(0.0); rows]
        }),
        None => {
            log::warn!("No velocity column selected. Using 0.0 for velocity values.");
            vec![Some(0.0); rows]
        }
    };

    Ok(depths
        .into_iter()
        .zip(velocities)
        .map(|(depth, velocity)| FlowReading { depth, velocity })
        .collect())
}

/// Rainfall intensities for the rainfall writer; a missing column reads as 0.0.
pub fn rainfall_samples(df: &DataFrame, rainfall_column: &str) -> Result<Vec<Option<f64>>, FdvError> {
    match float_column(df, rainfall_column)? {
        Some(values) => Ok(values),
        None => {
            log::error!(
                "Rainfall column '{}' not found. Using 0.0 for rainfall values.",
                rainfall_column
            );
            Ok(vec![Some(0.0); df.height()])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            "1_1|Depth|mm" => [Some(250.0), None, Some(0.0)],
            "1_2|Velocity|m/s" => [Some(0.8), Some(0.4), None],
            "1_3|Level|m" => [Some(0.25), Some(0.3), Some(0.35)],
            "1_4|Rainfall|mm" => [Some(0.2), None, Some(1.4)]
        )
        .unwrap()
    }

    #[test]
    fn millimetre_depths_become_metres() {
        let readings = flow_readings(&frame(), "1_1|Depth|mm", Some("1_2|Velocity|m/s")).unwrap();
        assert_eq!(
            readings,
            vec![
                FlowReading { depth: Some(0.25), velocity: Some(0.8) },
                FlowReading { depth: None, velocity: Some(0.4) },
                FlowReading { depth: Some(0.0), velocity: None },
            ]
        );
    }

    #[test]
    fn level_columns_are_left_in_metres() {
        let readings = flow_readings(&frame(), "1_3|Level|m", Some("1_2|Velocity|m/s")).unwrap();
        assert_eq!(readings[1].depth, Some(0.3));
    }

    #[test]
    fn absent_columns_read_as_zero() {
        let readings = flow_readings(&frame(), "1_3|Level|m", Some("nope")).unwrap();
        assert!(readings.iter().all(|r| r.velocity == Some(0.0)));

        let readings = flow_readings(&frame(), "missing", None).unwrap();
        assert_eq!(readings.len(), 3);
        assert!(readings.iter().all(|r| *r == FlowReading::new(0.0, 0.0)));

        assert_eq!(rainfall_samples(&frame(), "missing").unwrap(), vec![Some(0.0); 3]);
    }

    #[test]
    fn rainfall_keeps_nulls() {
        assert_eq!(
            rainfall_samples(&frame(), "1_4|Rainfall|mm").unwrap(),
            vec![Some(0.2), None, Some(1.4)]
        );
    }
}
