//! GPU-accelerated compute unit for tiled RQA runs.
//!
//! ## Purpose
//!
//! This module provides [`GpuUnit`], a compute unit that evaluates the
//! recurrence predicate for a whole index block in a `wgpu` compute kernel.
//! The kernel returns one classification code per cell; line detection and
//! boundary segments are then produced on the CPU by the same accumulator
//! every CPU variant uses, so accelerated blocks merge like any other block.
//!
//! ## Precision
//!
//! The kernel works in `f32`. A cell whose `f32` distance lies within a
//! rounding margin of the radius is reported as ambiguous and re-evaluated on
//! the CPU in the caller's precision. Cells outside the margin cannot change
//! side, so accelerated blocks match CPU blocks exactly. Blocks whose values
//! could overflow the `f32` accumulator are computed on the CPU instead.
//!
//! ## Failure handling
//!
//! The device is acquired on first use. Blocks exceeding the device's dispatch
//! or buffer limits are refused before any buffer is created. Acquisition,
//! limit and buffer-mapping failures surface as `RqaError::BlockComputation`
//! for the block being computed; nothing is retried.

use std::fmt;
use std::sync::OnceLock;

use bytemuck::{Pod, Zeroable};
use num_traits::Float;
use tracing::{debug, warn};
use wgpu::util::DeviceExt;

use rqa::internals::algorithms::{accumulate_block, BlockContext, BlockOutput, Cell, VariantScratch};
use rqa::internals::engine::{ComputeUnit, ComputeUnitInfo, UnitKind};
use rqa::internals::math::Metric;
use rqa::internals::primitives::{IndexBlock, Result, RqaError};

// -----------------------------------------------------------------------------
// Shader Source (WGSL)
// -----------------------------------------------------------------------------
const SHADER_SOURCE: &str = r#"
struct Params {
    rows: u32,
    cols: u32,
    dimension: u32,
    metric: u32, // 0 = taxicab, 1 = euclidean, 2 = maximum
    radius_low: f32,
    radius_high: f32,
}

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var<storage, read> x_vectors: array<f32>;
@group(0) @binding(2) var<storage, read> y_vectors: array<f32>;
@group(0) @binding(3) var<storage, read_write> codes: array<u32>;

// 0 = not recurrent, 1 = recurrent, 2 = ambiguous
@compute @workgroup_size(8, 8)
fn classify(@builtin(global_invocation_id) global_id: vec3<u32>) {
    let col = global_id.x;
    let row = global_id.y;
    if (row >= params.rows || col >= params.cols) {
        return;
    }

    let d = params.dimension;
    var acc = 0.0;
    for (var k = 0u; k < d; k = k + 1u) {
        let diff = abs(x_vectors[row * d + k] - y_vectors[col * d + k]);
        if (params.metric == 0u) {
            acc = acc + diff;
        } else if (params.metric == 1u) {
            acc = acc + diff * diff;
        } else {
            acc = max(acc, diff);
        }
    }
    var distance = acc;
    if (params.metric == 1u) {
        distance = sqrt(acc);
    }

    // Overflowed distances stay ambiguous.
    var code = 2u;
    if (distance <= params.radius_low) {
        code = 1u;
    } else if (distance > params.radius_high && distance <= 3.4028235e38) {
        code = 0u;
    }
    codes[row * params.cols + col] = code;
}
"#;

const WORKGROUP_EDGE: u32 = 8;

const CODE_NOT_RECURRENT: u32 = 0;
const CODE_RECURRENT: u32 = 1;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct GpuParams {
    rows: u32,
    cols: u32,
    dimension: u32,
    metric: u32,
    radius_low: f32,
    radius_high: f32,
    padding: [u32; 2],
}

fn metric_code(metric: Metric) -> u32 {
    match metric {
        Metric::Taxicab => 0,
        Metric::Euclidean => 1,
        Metric::Maximum => 2,
    }
}

/// Half-width of the band around the radius inside which an `f32` decision may differ.
fn rounding_margin(dimension: usize, magnitude: f64, radius: f64) -> f64 {
    let eps = f32::EPSILON as f64;
    8.0 * (dimension as f64 + 2.0) * eps * (2.0 * magnitude + radius) + f32::MIN_POSITIVE as f64
}

/// Whether the kernel's `f32` accumulator stays finite for components of at
/// most `magnitude` and the widened radius `radius_high`.
fn fits_f32(metric: Metric, dimension: usize, magnitude: f64, radius_high: f64) -> bool {
    let span = 2.0 * magnitude;
    let worst = match metric {
        Metric::Taxicab => dimension as f64 * span,
        Metric::Euclidean => dimension as f64 * span * span,
        Metric::Maximum => span,
    };
    let ceiling = f32::MAX as f64 / 2.0;
    worst.is_finite() && worst < ceiling && radius_high < ceiling
}

/// Reject blocks whose dispatch or buffers exceed the device limits.
fn check_block_limits(params: &GpuParams, limits: &wgpu::Limits) -> std::result::Result<(), String> {
    let groups_x = params.cols.div_ceil(WORKGROUP_EDGE);
    let groups_y = params.rows.div_ceil(WORKGROUP_EDGE);
    let max_groups = limits.max_compute_workgroups_per_dimension;
    if groups_x > max_groups || groups_y > max_groups {
        return Err(format!(
            "block needs {groups_x} x {groups_y} workgroups, device allows {max_groups}"
        ));
    }

    let word = std::mem::size_of::<u32>() as u64;
    let dimension = params.dimension as u64;
    let max_binding = limits.max_storage_buffer_binding_size as u64;
    let max_buffer = limits.max_buffer_size as u64;
    let buffers = [
        ("x vectors", params.rows as u64 * dimension * word),
        ("y vectors", params.cols as u64 * dimension * word),
        ("codes", params.rows as u64 * params.cols as u64 * word),
    ];
    for (name, bytes) in buffers {
        if bytes > max_binding || bytes > max_buffer {
            return Err(format!(
                "{name} buffer needs {bytes} bytes, device allows {}",
                max_binding.min(max_buffer)
            ));
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Device
// -----------------------------------------------------------------------------

struct GpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
    adapter_name: String,
}

impl GpuDevice {
    async fn acquire() -> std::result::Result<Self, String> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await
            .map_err(|e| format!("no GPU adapter found: {e}"))?;
        let adapter_name = adapter.get_info().name;

        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(&Default::default())
            .await
            .map_err(|e| format!("device error: {e:?}"))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("RQA Classify Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let storage = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("RQA Block Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage(1, true),
                storage(2, true),
                storage(3, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("RQA Pipeline Layout"),
            bind_group_layouts: &[&layout],
            ..Default::default()
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("classify"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("classify"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self {
            device,
            queue,
            layout,
            pipeline,
            adapter_name,
        })
    }

    /// Classify every cell of a `rows x cols` block.
    async fn classify(
        &self,
        x: &[f32],
        y: &[f32],
        params: GpuParams,
    ) -> std::result::Result<Vec<u32>, String> {
        check_block_limits(&params, &self.device.limits())?;
        let groups_x = params.cols.div_ceil(WORKGROUP_EDGE);
        let groups_y = params.rows.div_ceil(WORKGROUP_EDGE);

        let cells = params.rows as u64 * params.cols as u64;
        let size = cells * std::mem::size_of::<u32>() as u64;

        let params_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Params"),
                contents: bytemuck::cast_slice(&[params]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let x_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("X Vectors"),
                contents: bytemuck::cast_slice(x),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let y_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Y Vectors"),
                contents: bytemuck::cast_slice(y),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let codes_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Codes"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("RQA Block"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: x_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: y_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: codes_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Classify"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor::default());
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }
        encoder.copy_buffer_to_buffer(&codes_buffer, 0, &staging_buffer, 0, size);
        self.queue.submit(Some(encoder.finish()));

        let slice = staging_buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |v| {
            let _ = tx.send(v);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| format!("device poll failed: {e}"))?;

        match rx.receive().await {
            Some(Ok(())) => {
                let data = slice.get_mapped_range();
                let codes = bytemuck::cast_slice(&data).to_vec();
                drop(data);
                staging_buffer.unmap();
                Ok(codes)
            }
            Some(Err(e)) => Err(format!("buffer mapping failed: {e}")),
            None => Err("buffer mapping was abandoned".to_string()),
        }
    }
}

// -----------------------------------------------------------------------------
// Compute Unit
// -----------------------------------------------------------------------------

/// Compute unit backed by the default `wgpu` adapter.
pub struct GpuUnit {
    info: ComputeUnitInfo,
    device: OnceLock<std::result::Result<GpuDevice, String>>,
}

impl GpuUnit {
    /// Create a unit named `gpu` with capacity 1.
    pub fn new() -> Self {
        Self::with_capacity("gpu", 1.0)
    }

    /// Create a unit with an explicit name and capacity hint.
    pub fn with_capacity(name: impl Into<String>, capacity: f64) -> Self {
        Self {
            info: ComputeUnitInfo {
                name: name.into(),
                kind: UnitKind::Accelerator,
                capacity,
            },
            device: OnceLock::new(),
        }
    }

    fn device(&self) -> std::result::Result<&GpuDevice, String> {
        let acquired = self.device.get_or_init(|| {
            let acquired = pollster::block_on(GpuDevice::acquire());
            match &acquired {
                Ok(device) => debug!(unit = %self.info.name, adapter = %device.adapter_name, "GPU device acquired"),
                Err(reason) => warn!(unit = %self.info.name, %reason, "GPU device unavailable"),
            }
            acquired
        });
        acquired.as_ref().map_err(Clone::clone)
    }
}

impl Default for GpuUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GpuUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.device.get() {
            None => "unacquired",
            Some(Ok(_)) => "ready",
            Some(Err(_)) => "unavailable",
        };
        f.debug_struct("GpuUnit")
            .field("info", &self.info)
            .field("device", &state)
            .finish()
    }
}

fn to_f32<T: Float>(values: &[T]) -> Vec<f32> {
    values
        .iter()
        .map(|v| v.to_f32().unwrap_or(f32::NAN))
        .collect()
}

fn magnitude<T: Float>(values: &[T]) -> f64 {
    values
        .iter()
        .filter_map(|v| v.to_f64())
        .fold(0.0, |acc, v| acc.max(v.abs()))
}

impl<T: Float + Send + Sync> ComputeUnit<T> for GpuUnit {
    fn info(&self) -> &ComputeUnitInfo {
        &self.info
    }

    fn compute(
        &self,
        ctx: &BlockContext<'_, T>,
        block: IndexBlock,
        variant: rqa::internals::algorithms::Variant,
        scratch: &mut VariantScratch,
    ) -> Result<BlockOutput> {
        let fail = |reason: String| RqaError::BlockComputation {
            block,
            unit: self.info.name.clone(),
            reason,
        };

        let dimension = ctx.x_vectors.dimension();
        let x = &ctx.x_vectors.as_flat()[block.row_start * dimension..block.row_end * dimension];
        let y = &ctx.y_vectors.as_flat()[block.col_start * dimension..block.col_end * dimension];

        let radius = ctx.radius.to_f64().unwrap_or(f64::INFINITY);
        let largest = magnitude(x).max(magnitude(y));
        let margin = rounding_margin(dimension, largest, radius);
        if !fits_f32(ctx.metric, dimension, largest, radius + margin) {
            debug!(unit = %self.info.name, ?block, "values exceed f32 range, block computed on the CPU");
            return Ok(variant.compute(ctx, block, scratch));
        }

        let device = self.device().map_err(fail)?;
        let params = GpuParams {
            rows: block.rows() as u32,
            cols: block.cols() as u32,
            dimension: dimension as u32,
            metric: metric_code(ctx.metric),
            radius_low: (radius - margin) as f32,
            radius_high: (radius + margin) as f32,
            padding: [0, 0],
        };

        let codes = pollster::block_on(device.classify(&to_f32(x), &to_f32(y), params)).map_err(fail)?;
        let cols = block.cols();
        Ok(accumulate_block(
            block,
            ctx.theiler_corrector,
            variant.orientation,
            |i, j| {
                if ctx.is_excluded(i, j) {
                    return Cell::Excluded;
                }
                match codes[(i - block.row_start) * cols + (j - block.col_start)] {
                    CODE_RECURRENT => Cell::Recurrent,
                    CODE_NOT_RECURRENT => Cell::NonRecurrent,
                    _ => ctx.cell(i, j),
                }
            },
        ))
    }
}
