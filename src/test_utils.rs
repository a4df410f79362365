//! Synthetic capture builder for tests and benchmarks
//!
//! Real captures are tens of megabytes and not redistributable, so tests build
//! byte-exact containers in memory instead. This module uses only `std` so that
//! integration tests can include it directly with `#[path]`.

#![cfg(any(test, feature = "benchmark"))]

/// Size of the main header block.
pub const HEADER_SIZE: usize = 112;
/// Size of the disk sub-header that follows the main header.
pub const DISK_SUBHEADER_SIZE: usize = 32;
/// Size of one descriptor slot.
pub const VAR_SLOT_SIZE: usize = 144;

/// Type tags as stored in descriptor slots.
pub mod tag {
    pub const CHAR: i32 = 0;
    pub const BOOL: i32 = 1;
    pub const INT: i32 = 2;
    pub const BITFIELD: i32 = 3;
    pub const FLOAT: i32 = 4;
    pub const DOUBLE: i32 = 5;
}

#[derive(Debug, Clone)]
struct Channel {
    name: String,
    tag: i32,
    offset: usize,
}

/// Builds a capture: header, disk sub-header, descriptor table, session text, samples.
#[derive(Debug, Clone)]
pub struct CaptureBuilder {
    channels: Vec<Channel>,
    sample_size: usize,
    tick_rate: i32,
    version: i32,
    session_text: String,
    session_padding: usize,
    samples: Vec<Vec<u8>>,
    data_offset_override: Option<i32>,
    trailing_bytes: usize,
}

impl CaptureBuilder {
    /// Empty capture with no channels and the given sample stride.
    pub fn new(sample_size: usize) -> Self {
        Self {
            channels: Vec::new(),
            sample_size,
            tick_rate: 60,
            version: 2,
            session_text: String::new(),
            session_padding: 8,
            samples: Vec::new(),
            data_offset_override: None,
            trailing_bytes: 0,
        }
    }

    /// Capture carrying the lap timing channels at fixed offsets in a 24-byte sample:
    /// `Lap` (int @0), `LapLastLapTime` (float @4), `LapBestLapTime` (float @8),
    /// `SessionTime` (double @16).
    pub fn lap_timing() -> Self {
        Self::new(24)
            .channel("Lap", tag::INT, 0)
            .channel("LapLastLapTime", tag::FLOAT, 4)
            .channel("LapBestLapTime", tag::FLOAT, 8)
            .channel("SessionTime", tag::DOUBLE, 16)
            .session_text(&session_text("Autodromo Nazionale Monza", "Dallara F3", "Test Driver", 0))
    }

    pub fn channel(mut self, name: &str, tag: i32, offset: usize) -> Self {
        self.channels.push(Channel { name: name.to_string(), tag, offset });
        self
    }

    pub fn without_channel(mut self, name: &str) -> Self {
        self.channels.retain(|c| c.name != name);
        self
    }

    pub fn tick_rate(mut self, tick_rate: i32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    pub fn session_text(mut self, text: &str) -> Self {
        self.session_text = text.to_string();
        self
    }

    /// Number of NUL bytes appended after the session text inside the declared length.
    pub fn session_padding(mut self, padding: usize) -> Self {
        self.session_padding = padding;
        self
    }

    /// Write this value at offset 52 instead of the real data start.
    pub fn data_offset_override(mut self, offset: i32) -> Self {
        self.data_offset_override = Some(offset);
        self
    }

    /// Append a partial sample after the last full one.
    pub fn trailing_bytes(mut self, count: usize) -> Self {
        self.trailing_bytes = count;
        self
    }

    pub fn push_raw_sample(&mut self, mut bytes: Vec<u8>) -> &mut Self {
        bytes.resize(self.sample_size, 0);
        self.samples.push(bytes);
        self
    }

    /// Append one sample, filling whichever lap timing channels are present.
    pub fn push_lap_sample(&mut self, lap: i32, last_lap_time: f32, best_lap_time: f32) -> &mut Self {
        let mut sample = vec![0u8; self.sample_size];
        let index = self.samples.len();
        for channel in &self.channels {
            let value = match channel.name.as_str() {
                "Lap" => f64::from(lap),
                "LapLastLapTime" => f64::from(last_lap_time),
                "LapBestLapTime" => f64::from(best_lap_time),
                "SessionTime" => index as f64 / f64::from(self.tick_rate.max(1)),
                _ => continue,
            };
            write_value(&mut sample, channel.tag, channel.offset, value);
        }
        self.samples.push(sample);
        self
    }

    /// Append `count` identical lap samples.
    pub fn lap_samples(mut self, lap: i32, last_lap_time: f32, best_lap_time: f32, count: usize) -> Self {
        for _ in 0..count {
            self.push_lap_sample(lap, last_lap_time, best_lap_time);
        }
        self
    }

    /// Byte offset where the session text starts.
    pub fn session_info_offset(&self) -> usize {
        HEADER_SIZE + DISK_SUBHEADER_SIZE + self.channels.len() * VAR_SLOT_SIZE
    }

    /// Byte offset where the first sample starts.
    pub fn data_offset(&self) -> usize {
        let session_end = self.session_info_offset() + self.session_info_len();
        session_end.div_ceil(16) * 16
    }

    fn session_info_len(&self) -> usize {
        self.session_text.len() + self.session_padding
    }

    pub fn build(&self) -> Vec<u8> {
        let data_offset = self.data_offset();
        let total = data_offset + self.samples.len() * self.sample_size + self.trailing_bytes;
        let mut buf = vec![0u8; total];

        put_i32(&mut buf, 0, self.version);
        put_i32(&mut buf, 4, 1);
        put_i32(&mut buf, 8, self.tick_rate);
        put_i32(&mut buf, 12, 1);
        put_i32(&mut buf, 16, self.session_info_len() as i32);
        put_i32(&mut buf, 20, self.session_info_offset() as i32);
        put_i32(&mut buf, 24, self.channels.len() as i32);
        put_i32(&mut buf, 28, (HEADER_SIZE + DISK_SUBHEADER_SIZE) as i32);
        put_i32(&mut buf, 32, 1);
        put_i32(&mut buf, 36, self.sample_size as i32);
        put_i32(&mut buf, 48, self.samples.len() as i32);
        put_i32(&mut buf, 52, self.data_offset_override.unwrap_or(data_offset as i32));

        // disk sub-header
        buf[HEADER_SIZE..HEADER_SIZE + 8].copy_from_slice(&1_735_689_600i64.to_le_bytes());
        buf[HEADER_SIZE + 8..HEADER_SIZE + 16].copy_from_slice(&0.0f64.to_le_bytes());
        let end_time = self.samples.len() as f64 / f64::from(self.tick_rate.max(1));
        buf[HEADER_SIZE + 16..HEADER_SIZE + 24].copy_from_slice(&end_time.to_le_bytes());
        put_i32(&mut buf, HEADER_SIZE + 24, 0);
        put_i32(&mut buf, HEADER_SIZE + 28, self.samples.len() as i32);

        for (i, channel) in self.channels.iter().enumerate() {
            let slot = HEADER_SIZE + DISK_SUBHEADER_SIZE + i * VAR_SLOT_SIZE;
            put_i32(&mut buf, slot, channel.tag);
            put_i32(&mut buf, slot + 4, channel.offset as i32);
            put_i32(&mut buf, slot + 8, 1);
            put_str(&mut buf, slot + 16, 32, &channel.name);
            put_str(&mut buf, slot + 48, 64, &format!("{} channel", channel.name));
            put_str(&mut buf, slot + 112, 32, if channel.tag == tag::FLOAT { "s" } else { "" });
        }

        let session_offset = self.session_info_offset();
        buf[session_offset..session_offset + self.session_text.len()]
            .copy_from_slice(self.session_text.as_bytes());

        for (i, sample) in self.samples.iter().enumerate() {
            let start = data_offset + i * self.sample_size;
            buf[start..start + self.sample_size].copy_from_slice(sample);
        }

        buf
    }
}

/// Session text in the simulator's indented key/value layout.
pub fn session_text(track: &str, car: &str, driver: &str, precipitation: u8) -> String {
    format!(
        "---\n\
WeekendInfo:\n \
TrackName: monza full\n \
TrackDisplayName: {track}\n \
TrackDisplayShortName: Monza\n \
TrackSkies: Partly Cloudy\n \
TrackPrecipitation: {precipitation} %\n\
DriverInfo:\n \
DriverCarIdx: 0\n \
Drivers:\n \
- CarIdx: 0\n   \
UserName: {driver}\n   \
CarScreenName: {car}\n\
...\n"
    )
}

/// Capture whose lap boundaries report `lap_times` in order, after an out lap.
///
/// The `LapBestLapTime` channel tracks the running minimum.
pub fn capture_with_laps(lap_times: &[f32]) -> Vec<u8> {
    capture_builder_with_laps(lap_times).build()
}

pub fn capture_builder_with_laps(lap_times: &[f32]) -> CaptureBuilder {
    let mut builder = CaptureBuilder::lap_timing().lap_samples(0, 0.0, 0.0, 3);
    let mut best = f32::INFINITY;
    for (i, &time) in lap_times.iter().enumerate() {
        if time > 0.0 && time < best {
            best = time;
        }
        let reported_best = if best.is_finite() { best } else { 0.0 };
        builder = builder.lap_samples(i as i32 + 1, time, reported_best, 3);
    }
    builder
}

fn write_value(sample: &mut [u8], tag: i32, offset: usize, value: f64) {
    match tag {
        tag::CHAR => sample[offset] = value as i8 as u8,
        tag::BOOL => sample[offset] = u8::from(value != 0.0),
        tag::INT => sample[offset..offset + 4].copy_from_slice(&(value as i32).to_le_bytes()),
        tag::BITFIELD => sample[offset..offset + 4].copy_from_slice(&(value as u32).to_le_bytes()),
        tag::FLOAT => sample[offset..offset + 4].copy_from_slice(&(value as f32).to_le_bytes()),
        tag::DOUBLE => sample[offset..offset + 8].copy_from_slice(&value.to_le_bytes()),
        _ => {}
    }
}

fn put_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_str(buf: &mut [u8], offset: usize, width: usize, value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(width);
    buf[offset..offset + len].copy_from_slice(&bytes[..len]);
}
