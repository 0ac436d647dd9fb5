#[cfg(not(target_family = "wasm"))]
mod backend {
    #[cfg(feature = "wgpu")]
    pub use burn::backend::wgpu::{Wgpu as Backend, WgpuDevice as Device};

    #[cfg(all(feature = "tch-cpu", not(feature = "wgpu")))]
    pub use burn::backend::libtorch::{LibTorch as Backend, LibTorchDevice as Device};

    #[cfg(not(any(feature = "wgpu", feature = "tch-cpu")))]
    pub use burn::backend::ndarray::{NdArray as Backend, NdArrayDevice as Device};

    #[cfg(feature = "wgpu")]
    pub fn device() -> Device {
        Device::default()
    }

    #[cfg(not(feature = "wgpu"))]
    pub fn device() -> Device {
        Device::Cpu
    }
}

#[cfg(not(target_family = "wasm"))]
fn main() {
    use burn::backend::Autodiff;
    use clap::Parser;
    use digit_sketchpad::cli::{run, Cli};
    use tracing_subscriber::EnvFilter;

    let cli = Cli::parse();

    if cli.command.logs_to_terminal() {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    if let Err(err) = run::<Autodiff<backend::Backend>>(cli, backend::device()) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_family = "wasm")]
fn main() {}
