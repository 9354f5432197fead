// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// Maps the integer device selector onto a concrete Burn
// backend and runs a job generic over it:
//
//   device_id < 0   → Autodiff<NdArray>  on the CPU
//   device_id >= 0  → Autodiff<Wgpu>     on that GPU index
//                     (requires the `wgpu` cargo feature)
//
// The check happens before any data is loaded, so asking for
// an accelerator that this build cannot drive fails at once.
//
// Reference: Burn Book §2 (Backends)

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;

pub type CpuBackend = burn::backend::Autodiff<burn::backend::NdArray>;

#[cfg(feature = "wgpu")]
pub type GpuBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// A unit of work that can run on any autodiff backend.
pub trait BackendJob {
    type Output;

    fn run<B: AutodiffBackend>(self, device: B::Device) -> Result<Self::Output>;
}

/// Run `job` on the backend selected by `device_id`.
pub fn dispatch<J: BackendJob>(device_id: i32, job: J) -> Result<J::Output> {
    if device_id < 0 {
        let device = burn::backend::ndarray::NdArrayDevice::Cpu;
        tracing::info!("Using CPU device: {:?}", device);
        return job.run::<CpuBackend>(device);
    }
    run_on_accelerator(device_id as usize, job)
}

#[cfg(feature = "wgpu")]
fn run_on_accelerator<J: BackendJob>(index: usize, job: J) -> Result<J::Output> {
    let device = burn::backend::wgpu::WgpuDevice::DiscreteGpu(index);
    tracing::info!("Using WGPU device: {:?}", device);
    job.run::<GpuBackend>(device)
}

#[cfg(not(feature = "wgpu"))]
fn run_on_accelerator<J: BackendJob>(index: usize, _job: J) -> Result<J::Output> {
    anyhow::bail!(
        "accelerator device {index} requested, but this build has no accelerator support \
         (rebuild with `--features wgpu` or pass a negative device id)"
    )
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    struct BackendName;

    impl BackendJob for BackendName {
        type Output = String;

        fn run<B: AutodiffBackend>(self, _device: B::Device) -> Result<String> {
            Ok(B::name())
        }
    }

    #[test]
    fn test_negative_id_runs_on_cpu() {
        let name = dispatch(-1, BackendName).unwrap();
        assert!(name.to_lowercase().contains("ndarray"));
    }

    #[cfg(not(feature = "wgpu"))]
    #[test]
    fn test_accelerator_without_support_fails_fast() {
        assert!(dispatch(0, BackendName).is_err());
    }
}
