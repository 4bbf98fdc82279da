//! Metal compute backend for the pairwise engine.
//!
//! Mirrors the harness workspace's `asbb-gpu::MetalBackend`: a `Device` plus
//! a `CommandQueue` plus a compiled `Library`, built once and reused for
//! every dispatch. Unlike the harness backend's generic `dispatch_kernel`
//! (single buffer list, no threadgroup memory), the Needleman-Wunsch kernel
//! needs threadgroup-memory sizing for its shared scoring table and DP
//! rows, so this crate dispatches it directly rather than going through
//! that helper.

use msa_core::database::Database;
use msa_core::error::MsaError;
use msa_core::pair::Pair;
use msa_scoring::ScoringTable;
use metal::*;

const ALPHABET_SIZE: usize = 25;
const THREADS_PER_GROUP: u64 = 32;
const MAX_SHORT_LEN: usize = 4096;

/// One Metal device, command queue, and compiled shader library. Constructed
/// once per process (spec section 5.1: "one GPU stream per rank").
pub struct MsaGpuBackend {
    device: Device,
    command_queue: CommandQueue,
    pipeline: ComputePipelineState,
}

/// Host-side mirror of the shader's `PairMeta` struct: byte offsets and
/// lengths into the flattened code buffers for one pair. `#[repr(C)]` and
/// `Copy` so it uploads as plain bytes with no marshalling.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct PairMeta {
    long_offset: u32,
    long_len: u32,
    short_offset: u32,
    short_len: u32,
}

impl MsaGpuBackend {
    pub fn new() -> Result<Self, MsaError> {
        let device = Device::system_default()
            .ok_or_else(|| MsaError::DeviceOutOfMemory(0))?;
        let command_queue = device.new_command_queue();

        let shader_source = include_str!("shaders/needleman_wunsch.metal");
        let options = CompileOptions::new();
        let library = device
            .new_library_with_source(shader_source, &options)
            .map_err(|e| MsaError::DeviceOutOfMemory(shader_source.len()).annotated(&e))?;

        let function = library
            .get_function("needleman_wunsch", None)
            .map_err(|_| MsaError::UnknownAlgorithm("needleman_wunsch".to_string()))?;
        let pipeline = device
            .new_compute_pipeline_state_with_function(&function)
            .map_err(|_| MsaError::DeviceOutOfMemory(0))?;

        Ok(Self {
            device,
            command_queue,
            pipeline,
        })
    }

    /// Scores every pair in one dispatch: one threadgroup per pair, 32
    /// threads each, the longer sequence of the pair on the row axis. Pairs
    /// whose shorter sequence exceeds [`MAX_SHORT_LEN`] are rejected before
    /// dispatch rather than overflowing the fixed-size shared DP rows.
    ///
    /// Returns scores in the same order as `pairs`.
    pub fn score_pairs(
        &self,
        database: &Database,
        pairs: &[Pair],
        table: &ScoringTable,
    ) -> Result<Vec<f64>, MsaError> {
        if pairs.is_empty() {
            return Ok(Vec::new());
        }

        let mut codes_long = Vec::new();
        let mut codes_short = Vec::new();
        let mut metas = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let a = database
                .sequence(pair.min())
                .expect("pair references an indexed database entry");
            let b = database
                .sequence(pair.max())
                .expect("pair references an indexed database entry");

            let a_codes: Vec<u8> = (0..a.effective_len()).map(|i| a.get(i)).collect();
            let b_codes: Vec<u8> = (0..b.effective_len()).map(|i| b.get(i)).collect();
            let (long, short) = if a_codes.len() >= b_codes.len() {
                (a_codes, b_codes)
            } else {
                (b_codes, a_codes)
            };

            if short.len() > MAX_SHORT_LEN {
                return Err(MsaError::DeviceOutOfMemory(short.len()));
            }

            let meta = PairMeta {
                long_offset: codes_long.len() as u32,
                long_len: long.len() as u32,
                short_offset: codes_short.len() as u32,
                short_len: short.len() as u32,
            };
            codes_long.extend_from_slice(&long);
            codes_short.extend_from_slice(&short);
            metas.push(meta);
        }

        let scoring_matrix: Vec<f32> = (0..ALPHABET_SIZE)
            .flat_map(|row| (0..ALPHABET_SIZE).map(move |col| (row, col)))
            .map(|(row, col)| table.score(row as u8, col as u8) as f32)
            .collect();
        let gap_penalty = table.gap_penalty() as f32;

        let codes_long_buf = self.new_buffer_with_data(&codes_long);
        let codes_short_buf = self.new_buffer_with_data(&codes_short);
        let pairs_buf = self.new_buffer_with_data(&metas);
        let matrix_buf = self.new_buffer_with_data(&scoring_matrix);
        let gap_buf = self.new_buffer_with_data(&[gap_penalty]);
        let out_buf = self
            .device
            .new_buffer(
                (pairs.len() * std::mem::size_of::<f32>()) as u64,
                MTLResourceOptions::StorageModeShared,
            );

        let command_buffer = self.command_queue.new_command_buffer();
        let encoder = command_buffer.new_compute_command_encoder();
        encoder.set_compute_pipeline_state(&self.pipeline);
        encoder.set_buffer(0, Some(&codes_long_buf), 0);
        encoder.set_buffer(1, Some(&codes_short_buf), 0);
        encoder.set_buffer(2, Some(&pairs_buf), 0);
        encoder.set_buffer(3, Some(&matrix_buf), 0);
        encoder.set_buffer(4, Some(&gap_buf), 0);
        encoder.set_buffer(5, Some(&out_buf), 0);
        encoder.set_threadgroup_memory_length(
            0,
            (ALPHABET_SIZE * ALPHABET_SIZE * std::mem::size_of::<f32>()) as u64,
        );
        encoder.set_threadgroup_memory_length(
            1,
            ((MAX_SHORT_LEN + 1) * std::mem::size_of::<f32>()) as u64,
        );
        encoder.set_threadgroup_memory_length(
            2,
            ((MAX_SHORT_LEN + 1) * std::mem::size_of::<f32>()) as u64,
        );

        let threadgroups = MTLSize {
            width: pairs.len() as u64,
            height: 1,
            depth: 1,
        };
        let threads_per_threadgroup = MTLSize {
            width: THREADS_PER_GROUP,
            height: 1,
            depth: 1,
        };
        encoder.dispatch_thread_groups(threadgroups, threads_per_threadgroup);
        encoder.end_encoding();

        command_buffer.commit();
        command_buffer.wait_until_completed();

        let ptr = out_buf.contents() as *const f32;
        let scores = unsafe { std::slice::from_raw_parts(ptr, pairs.len()) };
        Ok(scores.iter().map(|&s| s as f64).collect())
    }

    fn new_buffer_with_data<T>(&self, data: &[T]) -> Buffer {
        let size = std::mem::size_of_val(data) as u64;
        if size == 0 {
            return self.device.new_buffer(1, MTLResourceOptions::StorageModeShared);
        }
        self.device.new_buffer_with_data(
            data.as_ptr() as *const std::ffi::c_void,
            size,
            MTLResourceOptions::StorageModeShared,
        )
    }
}

trait AnnotateError {
    fn annotated(self, detail: &dyn std::fmt::Display) -> Self;
}

impl AnnotateError for MsaError {
    /// Shader compile failures are surfaced as `DeviceOutOfMemory` (the
    /// closest taxonomy member to "device unusable"); this just logs the
    /// underlying Metal compiler diagnostic rather than discarding it.
    fn annotated(self, detail: &dyn std::fmt::Display) -> Self {
        log::warn!("metal shader compilation failed: {}", detail);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_construction_requires_a_metal_device() {
        // This test only asserts the call doesn't panic; whether it
        // succeeds depends on the host having a Metal-capable GPU, which
        // CI runners for this crate are not guaranteed to have.
        let _ = MsaGpuBackend::new();
    }
}
