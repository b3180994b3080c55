//! Safetensors-style I/O for the analysis binaries.
//!
//! The core only consumes in-memory arrays; these helpers are the boundary
//! collaborators that feed it. A recording file carries the channel matrix,
//! channel names, sampling rate and eyelink annotations; a group file
//! carries the paired `[subjects, time]` evoked matrices for one contrast.
//! Cluster results go out as JSON for the plotting layer.

use crate::cluster::ClusterTest;
use crate::error::{Error, Result};
use crate::recording::{Annotation, Channel, Recording};
use ndarray::{Array1, Array2};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

// ── Low-level safetensors parsing (header + f64 tensors only) ─────────────

fn parse_header(bytes: &[u8]) -> Result<(HashMap<String, serde_json::Value>, usize)> {
    if bytes.len() < 8 {
        return Err(Error::InvalidInput("safetensors file too small".into()));
    }
    let n = u64::from_le_bytes(bytes[..8].try_into().unwrap()) as usize;
    let header_bytes = 8usize
        .checked_add(n)
        .and_then(|end| bytes.get(8..end))
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "header claims {n} bytes but the file has {}",
                bytes.len()
            ))
        })?;
    let header = serde_json::from_slice(header_bytes)
        .map_err(|e| Error::InvalidInput(format!("bad safetensors header: {e}")))?;
    Ok((header, 8 + n))
}

fn tensor_bytes<'a>(
    bytes: &'a [u8],
    data_start: usize,
    entry: &serde_json::Value,
) -> Result<&'a [u8]> {
    let offsets = entry["data_offsets"]
        .as_array()
        .ok_or_else(|| Error::InvalidInput("tensor entry without data_offsets".into()))?;
    let s = offsets[0].as_u64().unwrap_or(0) as usize;
    let e = offsets[1].as_u64().unwrap_or(0) as usize;
    bytes
        .get(data_start + s..data_start + e)
        .ok_or_else(|| Error::InvalidInput("tensor offsets past end of file".into()))
}

fn read_f64_tensor(bytes: &[u8], data_start: usize, entry: &serde_json::Value) -> Result<Vec<f64>> {
    Ok(tensor_bytes(bytes, data_start, entry)?
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes(b.try_into().unwrap()))
        .collect())
}

fn shape_of(entry: &serde_json::Value) -> Vec<usize> {
    entry["shape"]
        .as_array()
        .map(|a| a.iter().map(|v| v.as_u64().unwrap_or(0) as usize).collect())
        .unwrap_or_default()
}

fn required<'a>(
    header: &'a HashMap<String, serde_json::Value>,
    key: &str,
) -> Result<&'a serde_json::Value> {
    header
        .get(key)
        .ok_or_else(|| Error::InvalidInput(format!("missing '{key}' tensor")))
}

fn read_string_tensor(
    bytes: &[u8],
    data_start: usize,
    entry: &serde_json::Value,
) -> Result<Vec<String>> {
    let raw = tensor_bytes(bytes, data_start, entry)?;
    let text = std::str::from_utf8(raw)
        .map_err(|e| Error::InvalidInput(format!("non-UTF-8 string tensor: {e}")))?;
    Ok(text.split('\n').filter(|s| !s.is_empty()).map(String::from).collect())
}

// ── Recording files ───────────────────────────────────────────────────────

/// Load a continuous recording.
///
/// Expected keys: `data` `[C, T]` f64, `sfreq` `[1]` f64, `ch_names`
/// (newline-joined string), and optionally `annot_onsets` / `annot_durations`
/// (`[N]` f64) with `annot_descriptions` (newline-joined string).
pub fn load_recording(path: &Path) -> Result<Recording> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::InvalidInput(format!("cannot read {}: {e}", path.display())))?;
    let (header, data_start) = parse_header(&bytes)?;

    let data_entry = required(&header, "data")?;
    let shape = shape_of(data_entry);
    if shape.len() != 2 {
        return Err(Error::InvalidInput(format!("'data' must be 2-D, got shape {shape:?}")));
    }
    let flat = read_f64_tensor(&bytes, data_start, data_entry)?;
    let data = Array2::from_shape_vec((shape[0], shape[1]), flat)
        .map_err(|e| Error::InvalidInput(e.to_string()))?;

    let sfreq = read_f64_tensor(&bytes, data_start, required(&header, "sfreq")?)?
        .first()
        .copied()
        .ok_or_else(|| Error::InvalidInput("empty 'sfreq' tensor".into()))?;

    let ch_names = read_string_tensor(&bytes, data_start, required(&header, "ch_names")?)?;
    if ch_names.len() != shape[0] {
        return Err(Error::DimensionMismatch(format!(
            "{} channel names for {} data rows",
            ch_names.len(),
            shape[0]
        )));
    }

    let annotations = match header.get("annot_onsets") {
        Some(onsets_entry) => {
            let onsets = read_f64_tensor(&bytes, data_start, onsets_entry)?;
            let durations =
                read_f64_tensor(&bytes, data_start, required(&header, "annot_durations")?)?;
            let descriptions =
                read_string_tensor(&bytes, data_start, required(&header, "annot_descriptions")?)?;
            if onsets.len() != durations.len() || onsets.len() != descriptions.len() {
                return Err(Error::DimensionMismatch(
                    "annotation onsets, durations and descriptions disagree in length".into(),
                ));
            }
            onsets
                .into_iter()
                .zip(durations)
                .zip(descriptions)
                .map(|((onset, duration), description)| Annotation { onset, duration, description })
                .collect()
        }
        None => vec![],
    };

    let channels = ch_names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Channel { name, data: data.row(i).to_owned() })
        .collect();
    Recording::new(channels, annotations, sfreq)
}

/// Write a recording back out with the same keys [`load_recording`] expects.
pub fn write_recording(rec: &Recording, path: &Path) -> Result<()> {
    let mut w = TensorWriter::new();
    let names: Vec<&str> = rec.channel_names().collect();
    let mut flat = Vec::with_capacity(names.len() * rec.n_times());
    for ch in rec.channels() {
        flat.extend(ch.data.iter());
    }
    w.add_f64("data", &flat, &[names.len(), rec.n_times()]);
    w.add_f64("sfreq", &[rec.sfreq], &[1]);
    w.add_string("ch_names", &names);
    if !rec.annotations.is_empty() {
        let onsets: Vec<f64> = rec.annotations.iter().map(|a| a.onset).collect();
        let durations: Vec<f64> = rec.annotations.iter().map(|a| a.duration).collect();
        let descriptions: Vec<&str> =
            rec.annotations.iter().map(|a| a.description.as_str()).collect();
        w.add_f64("annot_onsets", &onsets, &[onsets.len()]);
        w.add_f64("annot_durations", &durations, &[durations.len()]);
        w.add_string("annot_descriptions", &descriptions);
    }
    w.write(path)
}

// ── Group evoked files ────────────────────────────────────────────────────

/// Load the paired group matrices for one contrast.
///
/// Expected keys: `cond_a` and `cond_b` `[S, T]` f64, `times` `[T]` f64,
/// `subjects` (newline-joined string, row-aligned).
pub fn load_group_pair(
    path: &Path,
) -> Result<(crate::evoked::GroupEvoked, crate::evoked::GroupEvoked, Array1<f64>)> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::InvalidInput(format!("cannot read {}: {e}", path.display())))?;
    let (header, data_start) = parse_header(&bytes)?;

    let load_matrix = |key: &str| -> Result<Array2<f64>> {
        let entry = required(&header, key)?;
        let shape = shape_of(entry);
        if shape.len() != 2 {
            return Err(Error::InvalidInput(format!("'{key}' must be 2-D, got shape {shape:?}")));
        }
        let flat = read_f64_tensor(&bytes, data_start, entry)?;
        Array2::from_shape_vec((shape[0], shape[1]), flat)
            .map_err(|e| Error::InvalidInput(e.to_string()))
    };

    let a = load_matrix("cond_a")?;
    let b = load_matrix("cond_b")?;
    let times = Array1::from_vec(read_f64_tensor(&bytes, data_start, required(&header, "times")?)?);
    let subjects = read_string_tensor(&bytes, data_start, required(&header, "subjects")?)?;
    if times.len() != a.ncols() {
        return Err(Error::DimensionMismatch(format!(
            "{} time stamps for {} matrix columns",
            times.len(),
            a.ncols()
        )));
    }
    if subjects.len() != a.nrows() {
        return Err(Error::DimensionMismatch(format!(
            "{} subject ids for {} rows",
            subjects.len(),
            a.nrows()
        )));
    }

    Ok((
        crate::evoked::GroupEvoked { data: a, subjects: subjects.clone() },
        crate::evoked::GroupEvoked { data: b, subjects },
        times,
    ))
}

// ── Cluster result export ─────────────────────────────────────────────────

#[derive(Serialize)]
struct ClusterRecord {
    start: usize,
    stop: usize,
    mass: f64,
    p_value: f64,
}

#[derive(Serialize)]
struct ClusterReport {
    n_clusters: usize,
    clusters: Vec<ClusterRecord>,
    t_obs: Vec<f64>,
    mean_diff: Vec<f64>,
}

/// Write the cluster test outcome as JSON for the plotting layer. An empty
/// `clusters` array is an explicit null result, distinct from a missing file.
pub fn write_cluster_report(test: &ClusterTest, path: &Path) -> Result<()> {
    let report = ClusterReport {
        n_clusters: test.clusters.len(),
        clusters: test
            .clusters
            .iter()
            .map(|c| ClusterRecord {
                start: c.span.start,
                stop: c.span.end,
                mass: c.mass,
                p_value: c.p_value,
            })
            .collect(),
        t_obs: test.t_obs.to_vec(),
        mean_diff: test.mean_diff.to_vec(),
    };
    let text = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::InvalidInput(format!("cannot serialise cluster report: {e}")))?;
    std::fs::write(path, text)
        .map_err(|e| Error::InvalidInput(format!("cannot write {}: {e}", path.display())))
}

// ── Minimal safetensors writer (f64 + newline-joined strings) ─────────────

pub struct TensorWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl TensorWriter {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    pub fn add_f64_arr2(&mut self, name: &str, arr: &Array2<f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    pub fn add_string(&mut self, name: &str, values: &[&str]) {
        let joined = values.join("\n");
        let bytes = joined.into_bytes();
        let len = bytes.len();
        self.entries.push((name.to_string(), bytes, "U8", vec![len]));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset = 0usize;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(
                name.clone(),
                serde_json::json!({
                    "dtype": dtype,
                    "shape": shape,
                    "data_offsets": [offset, offset + data.len()],
                }),
            );
            offset += data.len();
        }
        let hdr = serde_json::to_vec(&header_map)
            .map_err(|e| Error::InvalidInput(format!("cannot serialise header: {e}")))?;
        let pad = (8 - hdr.len() % 8) % 8;
        let io_err = |e: std::io::Error| Error::InvalidInput(format!("write {}: {e}", path.display()));
        let mut f = std::fs::File::create(path).map_err(io_err)?;
        f.write_all(&((hdr.len() + pad) as u64).to_le_bytes()).map_err(io_err)?;
        f.write_all(&hdr).map_err(io_err)?;
        f.write_all(&vec![b' '; pad]).map_err(io_err)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data).map_err(io_err)?;
        }
        Ok(())
    }
}

impl Default for TensorWriter {
    fn default() -> Self {
        Self::new()
    }
}
