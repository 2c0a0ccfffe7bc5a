//! Bit-exact I/O of the combinatorial state.
//!
//! The wire format carries only what the structure owns: the current
//! dimension, the vertex payloads, per cell the vertex indices and payload,
//! and per cell the neighbor indices. Mirror indices are *not* written; the
//! reader reconstructs them by scanning each neighbor for the slot pointing
//! back. Payloads are opaque to the triangulation and stream through an
//! external [`PayloadCodec`]; [`JsonPayloadCodec`] is the serde-backed
//! default.
//!
//! Two framings share the format. `Textual` separates decimal tokens by
//! whitespace; `Binary` uses little-endian integers: 64-bit counts, 32-bit
//! element indices and a 32-bit signed dimension. The framing choice is the
//! out-of-band flag of the stream pair.
//!
//! Elements are indexed 0-based in pool enumeration order. On any malformed
//! stream the reader leaves the triangulation cleared.

use std::io::{BufRead, Write};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::core::collections::FastHashMap;
use crate::core::traits::payload::Payload;
use crate::core::triangulation_data_structure::{CellKey, Tds, VertexKey};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors reported by the serialization bridge.
#[derive(Debug, Error)]
pub enum TdsIoError {
    /// The underlying stream failed.
    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),
    /// The stream contents do not form a valid triangulation.
    #[error("malformed stream: {message}")]
    Malformed {
        /// What was wrong.
        message: String,
    },
    /// A vertex index read from the stream is out of range.
    #[error("vertex index {index} out of range for {count} vertices")]
    VertexIndexOutOfRange {
        /// The index read.
        index: usize,
        /// The declared vertex count.
        count: usize,
    },
    /// A full-cell index read from the stream is out of range.
    #[error("full cell index {index} out of range for {count} full cells")]
    FullCellIndexOutOfRange {
        /// The index read.
        index: usize,
        /// The declared full-cell count.
        count: usize,
    },
    /// The stream's current dimension does not fit this triangulation.
    #[error("stream dimension {found} does not fit ambient dimension {ambient}")]
    DimensionMismatch {
        /// Dimension declared by the stream.
        found: i32,
        /// Ambient dimension of the receiving triangulation.
        ambient: i32,
    },
    /// The payload codec failed to encode or decode a payload.
    #[error("payload codec error: {message}")]
    Codec {
        /// What the codec reported.
        message: String,
    },
}

/// Framing selector for the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireMode {
    /// Whitespace-separated decimal tokens.
    Textual,
    /// Little-endian fixed-width integers.
    Binary,
}

// =============================================================================
// PAYLOAD CODEC
// =============================================================================

/// Streaming codec for opaque payloads.
///
/// The triangulation interleaves payloads with its combinatorial records
/// but never inspects them; a codec must read back exactly the bytes (or,
/// in textual mode, the single whitespace-delimited token) it wrote.
pub trait PayloadCodec<T> {
    /// Writes one payload to the stream.
    fn write_payload(
        &self,
        writer: &mut dyn Write,
        mode: WireMode,
        value: &T,
    ) -> Result<(), TdsIoError>;

    /// Reads one payload from the stream.
    fn read_payload(&self, reader: &mut dyn BufRead, mode: WireMode) -> Result<T, TdsIoError>;
}

/// Serde-backed payload codec.
///
/// Textual mode writes the payload as one compact JSON token; payloads
/// whose JSON form embeds whitespace (e.g. string data containing spaces)
/// are not representable in textual mode and need a custom codec. Binary
/// mode length-prefixes the JSON bytes with a 32-bit little-endian count.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonPayloadCodec;

impl<T> PayloadCodec<T> for JsonPayloadCodec
where
    T: Serialize + DeserializeOwned,
{
    fn write_payload(
        &self,
        writer: &mut dyn Write,
        mode: WireMode,
        value: &T,
    ) -> Result<(), TdsIoError> {
        let encoded = serde_json::to_vec(value).map_err(|e| TdsIoError::Codec {
            message: e.to_string(),
        })?;
        match mode {
            WireMode::Textual => {
                writer.write_all(&encoded)?;
                writer.write_all(b" ")?;
            }
            WireMode::Binary => {
                let len = u32::try_from(encoded.len()).map_err(|_| TdsIoError::Codec {
                    message: "payload exceeds the 32-bit length prefix".to_string(),
                })?;
                writer.write_all(&len.to_le_bytes())?;
                writer.write_all(&encoded)?;
            }
        }
        Ok(())
    }

    fn read_payload(&self, reader: &mut dyn BufRead, mode: WireMode) -> Result<T, TdsIoError> {
        let bytes = match mode {
            WireMode::Textual => read_token(reader)?,
            WireMode::Binary => {
                let mut prefix = [0_u8; 4];
                reader.read_exact(&mut prefix)?;
                let mut bytes = vec![0_u8; u32::from_le_bytes(prefix) as usize];
                reader.read_exact(&mut bytes)?;
                bytes
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| TdsIoError::Codec {
            message: e.to_string(),
        })
    }
}

// =============================================================================
// TOKEN-LEVEL HELPERS
// =============================================================================

/// Reads one whitespace-delimited token, skipping leading whitespace.
fn read_token(reader: &mut dyn BufRead) -> Result<Vec<u8>, TdsIoError> {
    let mut token = Vec::new();
    loop {
        let (consumed, finished) = {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                if token.is_empty() {
                    return Err(TdsIoError::Malformed {
                        message: "unexpected end of stream".to_string(),
                    });
                }
                return Ok(token);
            }
            let mut consumed = 0;
            let mut finished = false;
            for &byte in buf {
                consumed += 1;
                if byte.is_ascii_whitespace() {
                    if !token.is_empty() {
                        finished = true;
                        break;
                    }
                } else {
                    token.push(byte);
                }
            }
            (consumed, finished)
        };
        reader.consume(consumed);
        if finished {
            return Ok(token);
        }
    }
}

fn parse_token<N>(token: &[u8]) -> Result<N, TdsIoError>
where
    N: std::str::FromStr,
{
    std::str::from_utf8(token)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| TdsIoError::Malformed {
            message: format!("unparsable token {:?}", String::from_utf8_lossy(token)),
        })
}

fn write_dimension(writer: &mut dyn Write, mode: WireMode, d: i32) -> Result<(), TdsIoError> {
    match mode {
        WireMode::Textual => write!(writer, "{d} ")?,
        WireMode::Binary => writer.write_all(&d.to_le_bytes())?,
    }
    Ok(())
}

fn read_dimension(reader: &mut dyn BufRead, mode: WireMode) -> Result<i32, TdsIoError> {
    match mode {
        WireMode::Textual => parse_token(&read_token(reader)?),
        WireMode::Binary => {
            let mut bytes = [0_u8; 4];
            reader.read_exact(&mut bytes)?;
            Ok(i32::from_le_bytes(bytes))
        }
    }
}

fn write_count(writer: &mut dyn Write, mode: WireMode, n: usize) -> Result<(), TdsIoError> {
    match mode {
        WireMode::Textual => write!(writer, "{n} ")?,
        WireMode::Binary => writer.write_all(&(n as u64).to_le_bytes())?,
    }
    Ok(())
}

fn read_count(reader: &mut dyn BufRead, mode: WireMode) -> Result<usize, TdsIoError> {
    let count: u64 = match mode {
        WireMode::Textual => parse_token(&read_token(reader)?)?,
        WireMode::Binary => {
            let mut bytes = [0_u8; 8];
            reader.read_exact(&mut bytes)?;
            u64::from_le_bytes(bytes)
        }
    };
    usize::try_from(count).map_err(|_| TdsIoError::Malformed {
        message: format!("count {count} does not fit this platform"),
    })
}

fn write_index(writer: &mut dyn Write, mode: WireMode, index: usize) -> Result<(), TdsIoError> {
    match mode {
        WireMode::Textual => write!(writer, "{index} ")?,
        WireMode::Binary => {
            let index = u32::try_from(index).map_err(|_| TdsIoError::Malformed {
                message: format!("element index {index} exceeds the 32-bit wire width"),
            })?;
            writer.write_all(&index.to_le_bytes())?;
        }
    }
    Ok(())
}

fn read_index(reader: &mut dyn BufRead, mode: WireMode) -> Result<usize, TdsIoError> {
    match mode {
        WireMode::Textual => parse_token(&read_token(reader)?),
        WireMode::Binary => {
            let mut bytes = [0_u8; 4];
            reader.read_exact(&mut bytes)?;
            Ok(u32::from_le_bytes(bytes) as usize)
        }
    }
}

// =============================================================================
// THE SERIALIZATION BRIDGE
// =============================================================================

impl<U, V, const D: usize> Tds<U, V, D>
where
    U: Payload,
    V: Payload,
{
    /// Writes the combinatorial state to `writer`.
    ///
    /// Layout: current dimension, vertex count, the vertex payloads in
    /// enumeration order, the cell count, then per cell its vertex indices
    /// followed by its payload, then per cell its neighbor indices. At
    /// dimension -1 cells carry no indices (the single vertex/cell pair is
    /// re-associated on read); neighbor records exist only from dimension 0
    /// up.
    ///
    /// # Errors
    ///
    /// Propagates stream and codec failures; the triangulation itself is
    /// never a source of errors here as long as its invariants hold.
    pub fn write_tds<W, C>(&self, writer: &mut W, mode: WireMode, codec: &C) -> Result<(), TdsIoError>
    where
        W: Write,
        C: PayloadCodec<Option<U>> + PayloadCodec<Option<V>>,
    {
        write_dimension(writer, mode, self.current_dimension())?;
        write_count(writer, mode, self.number_of_vertices())?;
        if self.number_of_vertices() == 0 {
            return Ok(());
        }

        let mut vertex_index: FastHashMap<VertexKey, usize> = FastHashMap::default();
        for (i, (key, vertex)) in self.vertices().iter().enumerate() {
            vertex_index.insert(key, i);
            codec.write_payload(writer, mode, &vertex.data)?;
        }

        write_count(writer, mode, self.number_of_full_cells())?;
        let slots = usize::try_from(self.current_dimension().max(-1) + 1).unwrap_or(0);

        let mut cell_index: FastHashMap<CellKey, usize> = FastHashMap::default();
        for (i, (key, cell)) in self.full_cells().iter().enumerate() {
            cell_index.insert(key, i);
            for j in 0..slots {
                let Some(v) = cell.vertex(j) else {
                    return Err(TdsIoError::Malformed {
                        message: format!("unset vertex slot {j} while writing"),
                    });
                };
                write_index(writer, mode, vertex_index[&v])?;
            }
            codec.write_payload(writer, mode, &cell.data)?;
        }

        if self.current_dimension() >= 0 {
            for cell in self.full_cells().values() {
                for j in 0..slots {
                    let Some(n) = cell.neighbor(j) else {
                        return Err(TdsIoError::Malformed {
                            message: format!("unset neighbor slot {j} while writing"),
                        });
                    };
                    write_index(writer, mode, cell_index[&n])?;
                }
            }
        }
        Ok(())
    }

    /// Replaces this triangulation with the one read from `reader`.
    ///
    /// Mirror indices are reconstructed from the neighbor records: for each
    /// cell and facet, the matching slot on the neighbor is the one that
    /// points back and whose covertex is not on the shared facet.
    ///
    /// # Errors
    ///
    /// On any failure (truncated stream, indices out of range,
    /// inconsistent counts, codec errors) the triangulation is left
    /// cleared.
    pub fn read_tds<R, C>(&mut self, reader: &mut R, mode: WireMode, codec: &C) -> Result<(), TdsIoError>
    where
        R: BufRead,
        C: PayloadCodec<Option<U>> + PayloadCodec<Option<V>>,
    {
        self.clear();
        let outcome = self.read_tds_inner(reader, mode, codec);
        if outcome.is_err() {
            tracing::debug!("malformed triangulation stream, clearing");
            self.clear();
        }
        outcome
    }

    fn read_tds_inner<R, C>(
        &mut self,
        reader: &mut R,
        mode: WireMode,
        codec: &C,
    ) -> Result<(), TdsIoError>
    where
        R: BufRead,
        C: PayloadCodec<Option<U>> + PayloadCodec<Option<V>>,
    {
        let dimension = read_dimension(reader, mode)?;
        if !(-2..=self.ambient_dimension()).contains(&dimension) {
            return Err(TdsIoError::DimensionMismatch {
                found: dimension,
                ambient: self.ambient_dimension(),
            });
        }
        let vertex_count = read_count(reader, mode)?;
        if vertex_count == 0 {
            if dimension != -2 {
                return Err(TdsIoError::Malformed {
                    message: format!("no vertices at dimension {dimension}"),
                });
            }
            return Ok(());
        }
        if dimension == -2 {
            return Err(TdsIoError::Malformed {
                message: format!("{vertex_count} vertices in an empty triangulation"),
            });
        }
        self.set_current_dimension(dimension);

        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            let data = codec.read_payload(reader, mode)?;
            vertices.push(self.new_vertex(data));
        }

        let cell_count = read_count(reader, mode)?;
        if cell_count == 0 {
            return Err(TdsIoError::Malformed {
                message: format!("no full cells at dimension {dimension}"),
            });
        }
        let slots = usize::try_from(dimension.max(-1) + 1).unwrap_or(0);

        let mut cells = Vec::with_capacity(cell_count);
        for _ in 0..cell_count {
            let s = self.new_full_cell();
            cells.push(s);
            for j in 0..slots {
                let index = read_index(reader, mode)?;
                let &v = vertices.get(index).ok_or(TdsIoError::VertexIndexOutOfRange {
                    index,
                    count: vertex_count,
                })?;
                self.associate_vertex_with_full_cell(s, j, v);
            }
            self.cell_mut(s).data = codec.read_payload(reader, mode)?;
        }

        if dimension == -1 {
            if vertex_count != 1 || cell_count != 1 {
                return Err(TdsIoError::Malformed {
                    message: format!(
                        "dimension -1 needs one vertex and one full cell, got {vertex_count} and {cell_count}"
                    ),
                });
            }
            self.associate_vertex_with_full_cell(cells[0], 0, vertices[0]);
            return Ok(());
        }

        for i in 0..cell_count {
            for j in 0..slots {
                let index = read_index(reader, mode)?;
                let &n = cells.get(index).ok_or(TdsIoError::FullCellIndexOutOfRange {
                    index,
                    count: cell_count,
                })?;
                self.cell_mut(cells[i]).set_neighbor(j, Some(n));
            }
        }

        self.reconstruct_mirror_indices(&cells, slots)?;

        for vertex in self.vertices().values() {
            if vertex.incident_cell().is_none() {
                return Err(TdsIoError::Malformed {
                    message: "a vertex belongs to no full cell".to_string(),
                });
            }
        }
        Ok(())
    }

    fn reconstruct_mirror_indices(
        &mut self,
        cells: &[CellKey],
        slots: usize,
    ) -> Result<(), TdsIoError> {
        for &s in cells {
            for j in 0..slots {
                if self.full_cells()[s].mirror_index(j).is_some() {
                    continue;
                }
                let Some(n) = self.full_cells()[s].neighbor(j) else {
                    return Err(TdsIoError::Malformed {
                        message: "a facet has no neighbor record".to_string(),
                    });
                };
                // the matching slot points back to s and its covertex is
                // the one vertex of n away from the shared facet
                let mirror = (0..slots).find(|&k| {
                    let neighbor = &self.full_cells()[n];
                    neighbor.neighbor(k) == Some(s)
                        && neighbor.vertex(k).is_some_and(|w| {
                            let cell = &self.full_cells()[s];
                            cell.index_of(w).is_none_or(|slot| slot == j)
                        })
                });
                let Some(k) = mirror else {
                    return Err(TdsIoError::Malformed {
                        message: "neighbor records are not symmetric".to_string(),
                    });
                };
                self.cell_mut(s).set_mirror_index(j, Some(k));
                self.cell_mut(n).set_mirror_index(k, Some(j));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    type T3 = Tds<u32, (), 3>;

    fn ladder(d: usize) -> T3 {
        let mut tds = T3::new();
        let inf = tds.insert_increase_dimension(None).unwrap();
        for _ in 0..d {
            tds.insert_increase_dimension(Some(inf)).unwrap();
        }
        tds
    }

    fn round_trip(tds: &T3, mode: WireMode) -> T3 {
        let mut buffer = Vec::new();
        tds.write_tds(&mut buffer, mode, &JsonPayloadCodec).unwrap();
        let mut recovered = T3::new();
        recovered
            .read_tds(&mut Cursor::new(buffer), mode, &JsonPayloadCodec)
            .unwrap();
        recovered
    }

    #[test]
    fn empty_round_trip() {
        let tds = T3::new();
        for mode in [WireMode::Textual, WireMode::Binary] {
            let recovered = round_trip(&tds, mode);
            assert!(recovered.is_empty());
            assert!(recovered.is_valid().is_ok());
        }
    }

    #[test]
    fn degenerate_dimensions_round_trip() {
        for d in 0..=2 {
            let tds = ladder(d);
            for mode in [WireMode::Textual, WireMode::Binary] {
                let recovered = round_trip(&tds, mode);
                assert_eq!(recovered.current_dimension(), tds.current_dimension());
                assert_eq!(recovered.number_of_vertices(), tds.number_of_vertices());
                assert_eq!(recovered.number_of_full_cells(), tds.number_of_full_cells());
                assert!(recovered.is_valid().is_ok());
            }
        }
    }

    #[test]
    fn payloads_survive_the_round_trip() {
        let mut tds = ladder(2);
        let keys: Vec<_> = tds.vertices().keys().collect();
        for (i, v) in keys.into_iter().enumerate() {
            tds.get_vertex_mut(v).unwrap().data = Some(u32::try_from(i).unwrap() * 10);
        }
        let recovered = round_trip(&tds, WireMode::Binary);
        let original: Vec<_> = tds.vertices().values().map(|v| v.data).collect();
        let read_back: Vec<_> = recovered.vertices().values().map(|v| v.data).collect();
        assert_eq!(original, read_back);
    }

    #[test]
    fn truncated_stream_leaves_the_tds_cleared() {
        let tds = ladder(2);
        let mut buffer = Vec::new();
        tds.write_tds(&mut buffer, WireMode::Binary, &JsonPayloadCodec)
            .unwrap();
        buffer.truncate(buffer.len() / 2);
        let mut target = T3::new();
        let result = target.read_tds(&mut Cursor::new(buffer), WireMode::Binary, &JsonPayloadCodec);
        assert!(result.is_err());
        assert!(target.is_empty());
        assert_eq!(target.number_of_vertices(), 0);
    }

    #[test]
    fn oversized_dimension_is_rejected() {
        let mut buffer = Vec::new();
        write_dimension(&mut buffer, WireMode::Textual, 7).unwrap();
        write_count(&mut buffer, WireMode::Textual, 0).unwrap();
        let mut target = T3::new();
        let result = target.read_tds(&mut Cursor::new(buffer), WireMode::Textual, &JsonPayloadCodec);
        assert!(matches!(result, Err(TdsIoError::DimensionMismatch { found: 7, .. })));
    }
}
