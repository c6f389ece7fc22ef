use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime};
use fdvflow::backend::CommandHandler;
use fdvflow::calculations::{build_calculator, PipeShape};
use fdvflow::{FlowFileWriter, FlowReading, RainfallFileWriter};
use std::fs::{self, File};
use std::io::BufWriter;

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 20)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn data_lines(text: &str) -> Vec<&str> {
    text.lines()
        .skip_while(|line| *line != "*CEND")
        .skip(1)
        .take_while(|line| !line.is_empty())
        .collect()
}

#[test]
fn half_full_circular_pipe() {
    let pipe = build_calculator(PipeShape::Circular, "1000").unwrap();
    let flow = pipe.calculator.perform_calculation(0.5, 1.0);
    assert_relative_eq!(flow, std::f64::consts::PI * 0.25 / 2.0 * 1000.0, epsilon = 1e-9);
    assert_eq!(format!("{:5.0}", flow), "  393");
}

#[test]
fn rectangular_channel() {
    let pipe = build_calculator(PipeShape::Rectangular, "1000").unwrap();
    assert_relative_eq!(pipe.calculator.perform_calculation(0.2, 0.5), 100.0, epsilon = 1e-9);
}

#[test]
fn flow_never_negative_for_any_shape() {
    let shapes = [
        (PipeShape::Circular, "600"),
        (PipeShape::Rectangular, "800"),
        (PipeShape::EggType1, "0.6,0.9"),
        (PipeShape::EggType2, "0.9"),
        (PipeShape::EggType2a, "0.6,0.9"),
        (PipeShape::TwoCirclesAndRectangle, "1.0,0.6"),
    ];
    for (shape, size) in shapes {
        let pipe = build_calculator(shape, size).unwrap();
        let mut last = 0.0;
        for step in 0..=100 {
            let flow = pipe.calculator.perform_calculation(0.01 * step as f64, 0.75);
            assert!(flow >= 0.0, "{} gave {} at step {}", shape, flow, step);
            assert!(flow >= last - 1e-6, "{} fell at step {}", shape, step);
            last = flow;
        }
        assert_eq!(pipe.calculator.perform_calculation(0.0, 0.75), 0.0);
    }
}

#[test]
fn twelve_readings_give_three_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.fdv");
    let pipe = build_calculator(PipeShape::Rectangular, "1000").unwrap();

    let mut writer = FlowFileWriter::new(BufWriter::new(File::create(&path).unwrap()));
    writer.set_site_name("site");
    writer.set_pipe_size(pipe.pipe_size);
    writer.set_calculator(pipe.calculator);
    writer.set_starting_time(at(0, 0));
    writer.set_ending_time(at(0, 55));
    writer.set_interval(5);
    let nulls = writer
        .create_fdv_flow(vec![FlowReading::new(0.2, 0.5); 12])
        .unwrap();
    assert_eq!(nulls, 0);
    drop(writer);

    let text = fs::read_to_string(&path).unwrap();
    let lines = data_lines(&text);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "  100  200 0.50  100  200 0.50");
    assert!(text.contains("202405200000 202405200055   5\n*CEND\n"));
    assert!(text.ends_with("\n\n*END\n"));
}

#[test]
fn rainfall_file_conserves_volume() {
    let samples = [
        Some(0.0),
        Some(0.0),
        Some(0.0),
        Some(0.8),
        None,
        Some(0.0),
        Some(0.0),
        Some(0.0),
        Some(0.0),
        Some(9.0),
        Some(0.4),
        Some(0.0),
    ];
    let mut writer = RainfallFileWriter::new(Vec::new());
    writer.set_site_name("RG5");
    writer.set_starting_time(at(0, 0));
    writer.set_ending_time(at(0, 22));
    writer.set_interval(2);
    assert_eq!(writer.create_fdv_rainfall(samples).unwrap(), 1);

    let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    let values: Vec<f64> = data_lines(&text)
        .iter()
        .flat_map(|line| line.split_whitespace())
        .map(|v| v.parse().unwrap())
        .collect();
    assert_eq!(values.len(), samples.len());
    assert_relative_eq!(values.iter().sum::<f64>(), 10.2, epsilon = 1e-9);
    assert_eq!(&values[..5], &[0.2, 0.2, 0.2, 0.2, 0.0]);
}

#[test]
fn csv_to_flow_file_through_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("DM4.csv");
    fs::write(
        &input,
        "Date/Time,4_1|Depth|mm\n\
         20/05/2024 00:00,300\n\
         20/05/2024 00:15,\n\
         20/05/2024 00:30,320\n",
    )
    .unwrap();

    let mut handler = CommandHandler::new();
    let processed = handler.process_file(&input).unwrap();
    assert_eq!(processed.site_name, "DM4");
    assert_eq!(processed.interval, 900);

    let output = dir.path().join("DM4.fdv");
    let summary = handler
        .create_fdv_flow(&output, None, None, "Egg Type 2", "1.0")
        .unwrap();
    assert_eq!(summary.null_readings.depth, 1);
    assert_eq!(summary.velocity_column, None);

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains(" -1.000 UNKNOWN"));
    assert_eq!(
        data_lines(&text),
        vec!["    0  300 0.00    0    0 0.00    0  320 0.00"]
    );
}
