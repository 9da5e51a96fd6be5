use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::SystemTime;

use crate::error::Result;
use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub t: f64,
    pub x: f64,
    pub y: f64,
}

/// Screen-space positions over a session, for later movement analysis.
#[derive(Debug, Clone)]
pub struct TrajectoryLog {
    start: SystemTime,
    samples: Vec<TrajectorySample>,
}

impl TrajectoryLog {
    pub fn new(start: SystemTime) -> Self {
        Self {
            start,
            samples: Vec::new(),
        }
    }

    pub fn record(&mut self, at: SystemTime, point: Point) {
        self.samples.push(TrajectorySample {
            t: seconds_since(self.start, at),
            x: point.x,
            y: point.y,
        });
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Total distance travelled, in pixels.
    pub fn path_length(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|w| Point::new(w[0].x, w[0].y).distance_squared(Point::new(w[1].x, w[1].y)).sqrt())
            .sum()
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_rows(path, &self.samples)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    pub t: f64,
    pub angle: f64,
}

/// Knee angles reported by the knee unit over a session.
#[derive(Debug, Clone)]
pub struct AngleLog {
    start: SystemTime,
    samples: Vec<AngleSample>,
}

impl AngleLog {
    pub fn new(start: SystemTime) -> Self {
        Self {
            start,
            samples: Vec::new(),
        }
    }

    pub fn record(&mut self, at: SystemTime, angle: f64) {
        self.samples.push(AngleSample {
            t: seconds_since(self.start, at),
            angle,
        });
    }

    pub fn samples(&self) -> &[AngleSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_rows(path, &self.samples)
    }
}

fn seconds_since(start: SystemTime, at: SystemTime) -> f64 {
    at.duration_since(start).unwrap_or_default().as_secs_f64()
}

fn write_rows<P: AsRef<Path>, T: Serialize>(path: P, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn records_relative_times() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(100);
        let mut log = TrajectoryLog::new(start);
        log.record(start + Duration::from_millis(250), Point::new(1.0, 2.0));
        assert_eq!(log.samples()[0].t, 0.25);
    }

    #[test]
    fn path_length_sums_segments() {
        let start = SystemTime::UNIX_EPOCH;
        let mut log = TrajectoryLog::new(start);
        log.record(start, Point::new(0.0, 0.0));
        log.record(start, Point::new(3.0, 4.0));
        log.record(start, Point::new(3.0, 10.0));
        assert_eq!(log.path_length(), 11.0);
    }

    #[test]
    fn write_csv_has_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trajectory.csv");
        let start = SystemTime::UNIX_EPOCH;
        let mut log = TrajectoryLog::new(start);
        log.record(start + Duration::from_secs(1), Point::new(10.0, 20.0));
        log.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("t,x,y"));
        assert_eq!(lines.next(), Some("1.0,10.0,20.0"));
    }

    #[test]
    fn knee_report_becomes_an_angle_row() {
        use crate::notify::{DeviceInbox, DeviceReport, KNEE_DEVICE};

        let dir = tempdir().unwrap();
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
        let inbox = DeviceInbox::new();
        inbox
            .uplink(KNEE_DEVICE)
            .send(r#"{"field":"angle","value":37.5}"#);

        let mut angles = AngleLog::new(start);
        for (_, report) in inbox.drain() {
            let DeviceReport::Angle(value) = report;
            angles.record(start + Duration::from_millis(1500), value);
        }
        let path = dir.path().join("angles.csv");
        angles.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("t,angle"));
        assert_eq!(lines.next(), Some("1.5,37.5"));
        assert_eq!(lines.next(), None);
    }
}
