//! Input providers: random generation, CSV files and interactive prompts.

use std::io::{self, BufRead, Write};
use std::path::Path;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::error::{Error, Result};
use crate::types::{Point, PointSet};

/// Draws points with integer coordinates uniformly from `[1, max_coordinate]`.
#[derive(Debug, Clone)]
pub struct PointGenerator {
    max_coordinate: u32,
    seed: Option<u64>,
}

impl PointGenerator {
    pub fn new(max_coordinate: u32, seed: Option<u64>) -> Self {
        Self { max_coordinate: max_coordinate.max(1), seed }
    }

    pub fn generate(&self, n: usize) -> Result<PointSet> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let points = (0..n)
            .map(|_| {
                let x = rng.gen_range(1..=self.max_coordinate);
                let y = rng.gen_range(1..=self.max_coordinate);
                Point::new(f64::from(x), f64::from(y))
            })
            .collect();

        debug!("Generated {} points in [1, {}]^2 (seed {:?})", n, self.max_coordinate, self.seed);
        PointSet::new(points)
    }
}

impl Default for PointGenerator {
    fn default() -> Self {
        Self::new(1000, None)
    }
}

/// Read points from a CSV file with an `x,y` header.
pub fn load_points_csv<P: AsRef<Path>>(path: P) -> Result<PointSet> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&path)?;

    let points = reader
        .deserialize::<Point>()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

    info!("Loaded {} points from {:?}", points.len(), path.as_ref());
    PointSet::new(points)
}

/// Write points as CSV with an `x,y` header.
pub fn write_points_csv<P: AsRef<Path>>(path: P, points: &PointSet) -> Result<()> {
    let mut writer = csv::Writer::from_path(&path)?;
    for point in points.iter() {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

/// Ask for an integer until `accept` approves one. EOF is an error.
pub fn prompt_usize<R, W, F>(input: &mut R, output: &mut W, label: &str, accept: F) -> Result<usize>
where
    R: BufRead,
    W: Write,
    F: Fn(usize) -> bool,
{
    let mut line = String::new();
    loop {
        write!(output, "{}: ", label)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("input ended while waiting for {}", label),
            )));
        }

        match line.trim().parse::<usize>() {
            Ok(value) if accept(value) => return Ok(value),
            _ => debug!("Rejected {:?} for {}", line.trim(), label),
        }
    }
}
