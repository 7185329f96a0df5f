//! Walk the sample scene through a full calibration and print every event.
//!
//! Usage: `cargo run --example replay_sample -- [x1,y1,z1 x2,y2,z2]`

use log::LevelFilter;
use scene_anchor::core::{init_with_level, Point3};
use scene_anchor::{SceneDefinition, SceneReconstructor, SolverParams};

fn parse_point(raw: &str) -> Option<Point3<f64>> {
    let v: Vec<f64> = raw
        .split(',')
        .map(|c| c.trim().parse().ok())
        .collect::<Option<_>>()?;
    (v.len() == 3).then(|| Point3::new(v[0], v[1], v[2]))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_with_level(LevelFilter::Info)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (l1, l2) = match args.as_slice() {
        [a, b] => (
            parse_point(a).ok_or("landmark 1 must be x,y,z")?,
            parse_point(b).ok_or("landmark 2 must be x,y,z")?,
        ),
        _ => (Point3::new(-2.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)),
    };

    let mut reconstructor =
        SceneReconstructor::new(SceneDefinition::sample(), SolverParams::default());
    println!("{}", reconstructor.status().prompt);

    for point in [l1, l2] {
        for event in reconstructor.capture_point(point) {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    if let Some(rec) = reconstructor.last_reconstruction() {
        for item in &rec.items {
            println!(
                "{:>6} {} -> ({:.3}, {:.3}, {:.3})",
                item.name, item.color, item.position.x, item.position.y, item.position.z
            );
        }
    }
    Ok(())
}
