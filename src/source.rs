//! JSON-lines landmark stream produced by an external hand tracker.
//!
//! One frame per line. Accepted forms:
//!
//! ```text
//! [[0.51, 0.62, -0.01], ...]            21 points, hand present
//! [{"x": 0.51, "y": 0.62, "z": 0.0}, ...]
//! null                                  no hand
//! []                                    no hand
//! {"t": 1.25, "landmarks": [...]}       explicit timestamp in seconds
//! ```
//!
//! Blank lines and `#` comments are skipped. A stream may mix both forms:
//! [`StreamClock`] places frames without `t` after the last stamped frame,
//! offset by the wall time between their arrivals.

use crate::config::SourceConfig;
use crate::error::{GestureKeysError, Result};
use crate::landmarks::Landmark;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// What a single line of the stream carried
#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    Hand(Vec<Landmark>),
    NoHand,
    /// The line was not valid frame JSON
    Unparseable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandFrame {
    /// 1-based line number in the stream
    pub line: u64,
    pub timestamp: Option<Duration>,
    pub input: FrameInput,
    /// When the reader pulled the line off the stream
    pub received_at: Instant,
}

impl HandFrame {
    pub fn points(&self) -> Option<&[Landmark]> {
        match &self.input {
            FrameInput::Hand(points) => Some(points),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePoint {
    Triple([f32; 3]),
    Pair([f32; 2]),
    Object(Landmark),
}

impl From<WirePoint> for Landmark {
    fn from(point: WirePoint) -> Self {
        match point {
            WirePoint::Triple(xyz) => Landmark::from(xyz),
            WirePoint::Pair([x, y]) => Landmark::new(x, y, 0.0),
            WirePoint::Object(landmark) => landmark,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireFrame {
    Stamped {
        t: f64,
        #[serde(default)]
        landmarks: Option<Vec<WirePoint>>,
    },
    Bare(Option<Vec<WirePoint>>),
}

/// Parse one non-empty line into a frame
pub fn parse_frame_line(line_number: u64, line: &str) -> HandFrame {
    let (timestamp, points) = match serde_json::from_str::<WireFrame>(line) {
        Ok(WireFrame::Stamped { t, landmarks }) => (Some(seconds_to_offset(t)), landmarks),
        Ok(WireFrame::Bare(landmarks)) => (None, landmarks),
        Err(e) => {
            return HandFrame {
                line: line_number,
                timestamp: None,
                input: FrameInput::Unparseable(e.to_string()),
                received_at: Instant::now(),
            }
        }
    };

    let input = match points {
        Some(points) if !points.is_empty() => {
            FrameInput::Hand(points.into_iter().map(Landmark::from).collect())
        }
        _ => FrameInput::NoHand,
    };

    HandFrame {
        line: line_number,
        timestamp,
        input,
        received_at: Instant::now(),
    }
}

/// Puts every frame of a stream on one session timeline
#[derive(Debug, Clone)]
pub struct StreamClock {
    anchor: Instant,
    offset: Duration,
}

impl StreamClock {
    /// Unstamped frames before any `t` count from `start`
    pub fn new(start: Instant) -> Self {
        Self {
            anchor: start,
            offset: Duration::ZERO,
        }
    }

    /// Session offset of `frame`. A stamped frame moves the clock to its
    /// `t`; an unstamped one lands at the last stamp plus the wall time
    /// since that stamp arrived.
    pub fn timestamp(&mut self, frame: &HandFrame) -> Duration {
        match frame.timestamp {
            Some(t) => {
                self.anchor = frame.received_at;
                self.offset = t;
                t
            }
            None => self.offset + frame.received_at.saturating_duration_since(self.anchor),
        }
    }
}

/// Negative or non-finite stamps clamp to the stream start
fn seconds_to_offset(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::ZERO)
}

/// Pull-style reader over a JSON-lines landmark stream
pub struct LandmarkStreamReader<R> {
    reader: R,
    line_number: u64,
    buffer: String,
}

impl<R: BufRead> LandmarkStreamReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for LandmarkStreamReader<R> {
    type Item = io::Result<HandFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.buffer.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    return Some(Ok(parse_frame_line(self.line_number, line)));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Open the configured stream: a file path, or stdin for "-"
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn BufRead + Send>> {
    if config.is_stdin() {
        info!("Reading landmark frames from stdin");
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        info!("Reading landmark frames from {}", config.path);
        let file = File::open(&config.path).map_err(|e| {
            GestureKeysError::component(
                "source".to_string(),
                format!("Failed to open {}: {}", config.path, e),
            )
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read frames on a blocking thread and hand them over in order.
///
/// The returned task resolves to the number of frames delivered. It ends at
/// end of stream, when the receiver is dropped, or when `cancel` fires
/// between two lines.
pub fn spawn_frame_reader<R>(
    reader: R,
    capacity: usize,
    cancel: CancellationToken,
) -> (mpsc::Receiver<HandFrame>, JoinHandle<Result<u64>>)
where
    R: BufRead + Send + 'static,
{
    let (sender, receiver) = mpsc::channel(capacity.max(1));

    let handle = task::spawn_blocking(move || {
        let mut frames = 0u64;

        for item in LandmarkStreamReader::new(reader) {
            if cancel.is_cancelled() {
                debug!("Frame reader cancelled after {} frames", frames);
                break;
            }

            let frame = match item {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Failed to read landmark stream: {}", e);
                    return Err(e.into());
                }
            };

            if sender.blocking_send(frame).is_err() {
                debug!("Frame receiver dropped, stopping reader");
                break;
            }
            frames += 1;
        }

        debug!("Frame reader exited after {} frames", frames);
        Ok(frames)
    });

    (receiver, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn hand_json(n: usize) -> String {
        let points: Vec<[f32; 3]> = (0..n).map(|i| [0.5, i as f32 / 21.0, 0.0]).collect();
        serde_json::to_string(&points).unwrap()
    }

    #[test]
    fn test_parse_bare_triples() {
        let frame = parse_frame_line(1, &hand_json(21));
        assert_eq!(frame.timestamp, None);
        assert_eq!(frame.points().unwrap().len(), 21);
        assert_eq!(frame.points().unwrap()[2].y, 2.0 / 21.0);
    }

    #[test]
    fn test_parse_objects_and_pairs() {
        let frame = parse_frame_line(1, r#"[{"x": 0.1, "y": 0.2}, [0.3, 0.4]]"#);
        let points = frame.points().unwrap();
        assert_eq!(points[0], Landmark::new(0.1, 0.2, 0.0));
        assert_eq!(points[1], Landmark::new(0.3, 0.4, 0.0));
    }

    #[test]
    fn test_parse_no_hand_forms() {
        assert_eq!(parse_frame_line(1, "null").input, FrameInput::NoHand);
        assert_eq!(parse_frame_line(1, "[]").input, FrameInput::NoHand);

        let frame = parse_frame_line(3, r#"{"t": 0.75, "landmarks": null}"#);
        assert_eq!(frame.input, FrameInput::NoHand);
        assert_eq!(frame.timestamp, Some(Duration::from_millis(750)));
        assert_eq!(frame.line, 3);

        let frame = parse_frame_line(4, r#"{"t": 1.5}"#);
        assert_eq!(frame.input, FrameInput::NoHand);
    }

    #[test]
    fn test_parse_stamped_hand() {
        let line = format!(r#"{{"t": 2.0, "landmarks": {}}}"#, hand_json(21));
        let frame = parse_frame_line(1, &line);
        assert_eq!(frame.timestamp, Some(Duration::from_secs(2)));
        assert_eq!(frame.points().unwrap().len(), 21);
    }

    #[test]
    fn test_negative_timestamp_clamps_to_zero() {
        let frame = parse_frame_line(1, r#"{"t": -4.0, "landmarks": null}"#);
        assert_eq!(frame.timestamp, Some(Duration::ZERO));
    }

    #[test]
    fn test_wrong_count_is_passed_through() {
        // cardinality is checked by the classifier, not the parser
        let frame = parse_frame_line(1, &hand_json(7));
        assert_eq!(frame.points().unwrap().len(), 7);
    }

    #[test]
    fn test_unparseable_line() {
        let frame = parse_frame_line(9, "{not json");
        assert!(matches!(frame.input, FrameInput::Unparseable(_)));
        assert_eq!(frame.line, 9);
        assert!(frame.points().is_none());
    }

    #[test]
    fn test_reader_skips_blank_and_comment_lines() {
        let input = format!("# recorded session\n\nnull\n   \n{}\n", hand_json(21));
        let mut reader = LandmarkStreamReader::new(Cursor::new(input));

        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.line, 3);
        assert_eq!(first.input, FrameInput::NoHand);

        let second = reader.next().unwrap().unwrap();
        assert_eq!(second.line, 5);
        assert!(second.points().is_some());

        assert!(reader.next().is_none());
    }

    #[tokio::test]
    async fn test_spawned_reader_preserves_order() {
        let input = "null\n[]\n{\"t\": 1.0}\n";
        let (mut frames, handle) =
            spawn_frame_reader(Cursor::new(input), 1, CancellationToken::new());

        let mut lines = Vec::new();
        while let Some(frame) = frames.recv().await {
            lines.push(frame.line);
        }

        assert_eq!(lines, vec![1, 2, 3]);
        assert_eq!(handle.await.unwrap().unwrap(), 3);
    }

    fn frame_at(timestamp: Option<f64>, received_at: Instant) -> HandFrame {
        HandFrame {
            line: 1,
            timestamp: timestamp.map(Duration::from_secs_f64),
            input: FrameInput::NoHand,
            received_at,
        }
    }

    #[test]
    fn test_stream_clock_unstamped_only() {
        let start = Instant::now();
        let mut clock = StreamClock::new(start);

        let at = clock.timestamp(&frame_at(None, start + Duration::from_millis(300)));
        assert_eq!(at, Duration::from_millis(300));
    }

    #[test]
    fn test_stream_clock_continues_after_last_stamp() {
        let start = Instant::now();
        let mut clock = StreamClock::new(start);

        let stamped = frame_at(Some(100.0), start + Duration::from_secs(1));
        assert_eq!(clock.timestamp(&stamped), Duration::from_secs(100));

        let bare = frame_at(None, start + Duration::from_millis(1500));
        assert_eq!(clock.timestamp(&bare), Duration::from_millis(100_500));

        let restamped = frame_at(Some(105.0), start + Duration::from_secs(2));
        assert_eq!(clock.timestamp(&restamped), Duration::from_secs(105));

        let bare = frame_at(None, start + Duration::from_secs(2));
        assert_eq!(clock.timestamp(&bare), Duration::from_secs(105));
    }

    #[test]
    fn test_open_missing_file_fails() {
        let config = SourceConfig {
            path: "/nonexistent/landmarks.jsonl".to_string(),
            channel_capacity: 4,
        };
        assert!(open_source(&config).is_err());
    }
}
