//! Continuous recording model: named channels, annotations, sampling rate.
//!
//! Cleaning stages replace a single channel's samples without touching the
//! rest of the recording; annotations and unrelated channels are never
//! rebuilt when one channel is edited.

use crate::error::{Error, Result};
use ndarray::Array1;

/// One named signal bound to a physiological source (e.g. `"LPupil"`).
#[derive(Debug, Clone)]
pub struct Channel {
    pub name: String,
    pub data: Array1<f64>,
}

/// A discrete event marked by the eye-tracker parser (blink, saccade,
/// fixation), in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub onset: f64,
    pub duration: f64,
    pub description: String,
}

/// One subject's continuous recording.
#[derive(Debug, Clone)]
pub struct Recording {
    channels: Vec<Channel>,
    pub annotations: Vec<Annotation>,
    pub sfreq: f64,
}

impl Recording {
    /// Build a recording from channels sharing one length and sampling rate.
    pub fn new(channels: Vec<Channel>, annotations: Vec<Annotation>, sfreq: f64) -> Result<Self> {
        if !(sfreq > 0.0) {
            return Err(Error::InvalidInput(format!("sampling rate must be positive, got {sfreq}")));
        }
        if channels.is_empty() {
            return Err(Error::InvalidInput("a recording needs at least one channel".into()));
        }
        let n = channels[0].data.len();
        for ch in &channels[1..] {
            if ch.data.len() != n {
                return Err(Error::DimensionMismatch(format!(
                    "channel {} has {} samples, expected {n}",
                    ch.name,
                    ch.data.len()
                )));
            }
        }
        Ok(Self { channels, annotations, sfreq })
    }

    /// Number of samples per channel.
    pub fn n_times(&self) -> usize {
        self.channels[0].data.len()
    }

    /// Sample timestamps in seconds.
    pub fn times(&self) -> Array1<f64> {
        Array1::from_iter((0..self.n_times()).map(|i| i as f64 / self.sfreq))
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|c| c.name.as_str())
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Replace the samples of an existing channel. Only that channel is
    /// touched; annotations and the other channels are left as they are.
    pub fn replace_channel(&mut self, name: &str, data: Array1<f64>) -> Result<()> {
        if data.len() != self.n_times() {
            return Err(Error::DimensionMismatch(format!(
                "replacement for {name} has {} samples, recording has {}",
                data.len(),
                self.n_times()
            )));
        }
        let ch = self
            .channels
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::InvalidInput(format!("no channel named {name}")))?;
        ch.data = data;
        Ok(())
    }

    /// Append a derived channel (e.g. an event regressor).
    pub fn add_channel(&mut self, name: &str, data: Array1<f64>) -> Result<()> {
        if data.len() != self.n_times() {
            return Err(Error::DimensionMismatch(format!(
                "new channel {name} has {} samples, recording has {}",
                data.len(),
                self.n_times()
            )));
        }
        if self.channel(name).is_some() {
            return Err(Error::InvalidInput(format!("channel {name} already exists")));
        }
        self.channels.push(Channel { name: name.to_string(), data });
        Ok(())
    }
}
