use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

use noiseball::{
    FrameContext, GpuBackend, NoiseBall, NoiseBallConfig, RecordingBackend, gpu::types::NodeState,
};

/// Drive a GPU noise ball: inspect sizing, trace backend commands, or render headless.
#[derive(Parser)]
#[command(name = "noiseball")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the buffer sizing a configuration resolves to
    Inspect {
        /// Config file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the capacity ceiling
        #[arg(short, long)]
        max_nodes: Option<u32>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run frames on the recording backend and print every GPU command
    Trace {
        /// Config file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames to run
        #[arg(short, long, default_value = "3")]
        frames: u32,

        /// Change max nodes before a frame, e.g. `--resize-at 2=256`
        #[arg(long = "resize-at", value_name = "FRAME=NODES")]
        resize_at: Vec<ResizeAt>,
    },
    /// Run frames on the GPU and optionally capture the last one
    #[cfg(feature = "gpu")]
    Run {
        /// Config file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u32,

        /// Change max nodes before a frame, e.g. `--resize-at 60=4096`
        #[arg(long = "resize-at", value_name = "FRAME=NODES")]
        resize_at: Vec<ResizeAt>,

        /// Icosphere subdivisions of the node mesh
        #[arg(long, default_value = "1")]
        subdivisions: u32,

        /// Target width in pixels
        #[arg(long, default_value = "512")]
        width: u32,

        /// Target height in pixels
        #[arg(long, default_value = "512")]
        height: u32,

        /// Write the final frame as a binary PPM
        #[arg(long)]
        capture: Option<PathBuf>,
    },
}

/// A capacity change scheduled before a given frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResizeAt {
    frame: u32,
    max_nodes: u32,
}

impl FromStr for ResizeAt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (frame, nodes) = s
            .split_once('=')
            .ok_or_else(|| format!("expected FRAME=NODES, got '{s}'"))?;
        Ok(Self {
            frame: frame
                .trim()
                .parse()
                .map_err(|e| format!("bad frame '{frame}': {e}"))?,
            max_nodes: nodes
                .trim()
                .parse()
                .map_err(|e| format!("bad node count '{nodes}': {e}"))?,
        })
    }
}

const FRAME_RATE: f32 = 60.0;

#[derive(Serialize)]
struct Inspection {
    config: NoiseBallConfig,
    node_count: u32,
    thread_groups: u32,
    max_edges: u32,
    node_buffer_bytes: u64,
    mesh_index_count: u32,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<NoiseBallConfig> {
    Ok(match path {
        Some(path) => NoiseBallConfig::load(path)?,
        None => NoiseBallConfig::default(),
    })
}

fn build(config: NoiseBallConfig) -> anyhow::Result<NoiseBall> {
    Ok(NoiseBall::builder()
        .config(config)
        .with_default_assets()
        .build()?)
}

fn inspect(config: Option<&Path>, max_nodes: Option<u32>, json: bool) -> anyhow::Result<()> {
    let mut config = load_config(config)?;
    if let Some(max_nodes) = max_nodes {
        config.max_nodes = max_nodes;
    }
    let ball = build(config)?;
    let config = *ball.config();

    let inspection = Inspection {
        config,
        node_count: config.node_count(),
        thread_groups: config.thread_group_count(),
        max_edges: config.max_edges(),
        node_buffer_bytes: config.node_count() as u64 * std::mem::size_of::<NodeState>() as u64,
        mesh_index_count: ball.mesh().index_count(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
    } else {
        println!("max nodes:       {}", config.max_nodes);
        println!("node count:      {}", inspection.node_count);
        println!("thread groups:   {}", inspection.thread_groups);
        println!("max edges:       {}", inspection.max_edges);
        println!("node buffer:     {} B (x2)", inspection.node_buffer_bytes);
        println!("mesh indices:    {}", inspection.mesh_index_count);
        println!("scale:           {}", config.scale);
        println!("growth rate:     {}", config.growth_rate);
        println!("max size:        {}", config.max_size);
    }
    Ok(())
}

/// Apply any resize scheduled for `frame`, run it, and return the report
fn run_frame<B: GpuBackend + ?Sized>(
    ball: &mut NoiseBall,
    backend: &mut B,
    frame: u32,
    resize_at: &[ResizeAt],
) -> noiseball::FrameReport {
    for resize in resize_at.iter().filter(|r| r.frame == frame) {
        tracing::info!(frame, max_nodes = resize.max_nodes, "resizing");
        ball.set_max_nodes(resize.max_nodes);
    }
    ball.update(backend, &FrameContext::at(frame as f32 / FRAME_RATE))
}

fn trace(config: Option<&Path>, frames: u32, resize_at: &[ResizeAt]) -> anyhow::Result<()> {
    let mut ball = build(load_config(config)?)?;
    let mut backend = RecordingBackend::new();

    for frame in 0..frames {
        let report = run_frame(&mut ball, &mut backend, frame, resize_at);
        println!(
            "frame {frame} nodes={} drawn={}{}",
            report.node_count,
            report.drawn_buffer,
            if report.reinitialized { " (reinitialized)" } else { "" }
        );
        for command in backend.take_commands() {
            println!("  {command}");
        }
    }

    ball.teardown(&mut backend);
    println!("teardown");
    for command in backend.take_commands() {
        println!("  {command}");
    }
    println!("live buffers: {}", backend.live_buffer_count());
    Ok(())
}

#[cfg(feature = "gpu")]
#[allow(clippy::too_many_arguments)]
fn run(
    config: Option<&Path>,
    frames: u32,
    resize_at: &[ResizeAt],
    subdivisions: u32,
    width: u32,
    height: u32,
    capture: Option<&Path>,
) -> anyhow::Result<()> {
    use noiseball::assets::Mesh;
    use noiseball::gpu::{OrbitCamera, WgpuBackend};

    let mut ball = NoiseBall::builder()
        .config(load_config(config)?)
        .mesh(Mesh::icosphere(subdivisions))
        .with_default_assets()
        .build()?;
    let mut backend = WgpuBackend::new(width, height)?;
    let mut camera = OrbitCamera::new(width as f32 / height.max(1) as f32);

    let started = std::time::Instant::now();
    for frame in 0..frames {
        camera.orbit(0.01, 0.0);
        backend.set_camera(&camera.uniforms());
        run_frame(&mut ball, &mut backend, frame, resize_at);
        backend.submit();
    }
    tracing::info!(frames, elapsed = ?started.elapsed(), "finished");

    if let Some(path) = capture {
        let pixels = backend.read_pixels()?;
        write_ppm(path, backend.width(), backend.height(), &pixels)?;
        println!("Captured {}x{} frame to {}", width, height, path.display());
    }

    ball.teardown(&mut backend);
    Ok(())
}

/// Write RGBA8 pixels as a binary (P6) PPM, dropping alpha
#[cfg(feature = "gpu")]
fn write_ppm(path: &Path, width: u32, height: u32, rgba: &[u8]) -> std::io::Result<()> {
    let mut data = format!("P6\n{width} {height}\n255\n").into_bytes();
    data.reserve((width * height * 3) as usize);
    for pixel in rgba.chunks_exact(4) {
        data.extend_from_slice(&pixel[..3]);
    }
    std::fs::write(path, data)
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,noiseball=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect {
            config,
            max_nodes,
            json,
        } => inspect(config.as_deref(), max_nodes, json)?,
        Commands::Trace {
            config,
            frames,
            resize_at,
        } => trace(config.as_deref(), frames, &resize_at)?,
        #[cfg(feature = "gpu")]
        Commands::Run {
            config,
            frames,
            resize_at,
            subdivisions,
            width,
            height,
            capture,
        } => run(
            config.as_deref(),
            frames,
            &resize_at,
            subdivisions,
            width,
            height,
            capture.as_deref(),
        )?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_inspect_defaults() {
        let cli = Cli::try_parse_from(["noiseball", "inspect"]).unwrap();
        match cli.command {
            Commands::Inspect {
                config,
                max_nodes,
                json,
            } => {
                assert!(config.is_none());
                assert!(max_nodes.is_none());
                assert!(!json);
            }
            _ => panic!("Expected Inspect command"),
        }
    }

    #[test]
    fn cli_parses_trace_with_resizes() {
        let cli = Cli::try_parse_from([
            "noiseball",
            "trace",
            "--frames",
            "5",
            "--resize-at",
            "2=256",
            "--resize-at",
            "4=64",
        ])
        .unwrap();
        match cli.command {
            Commands::Trace {
                frames, resize_at, ..
            } => {
                assert_eq!(frames, 5);
                assert_eq!(
                    resize_at,
                    vec![
                        ResizeAt {
                            frame: 2,
                            max_nodes: 256
                        },
                        ResizeAt {
                            frame: 4,
                            max_nodes: 64
                        },
                    ]
                );
            }
            _ => panic!("Expected Trace command"),
        }
    }

    #[test]
    fn cli_rejects_malformed_resize() {
        assert!(Cli::try_parse_from(["noiseball", "trace", "--resize-at", "256"]).is_err());
        assert!(Cli::try_parse_from(["noiseball", "trace", "--resize-at", "a=1"]).is_err());
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["noiseball"]).is_err());
    }

    #[test]
    fn resize_is_applied_before_its_frame() {
        let mut ball = build(NoiseBallConfig::default().with_max_nodes(64)).unwrap();
        let mut backend = RecordingBackend::new();
        let schedule = [ResizeAt {
            frame: 1,
            max_nodes: 128,
        }];

        let first = run_frame(&mut ball, &mut backend, 0, &schedule);
        let second = run_frame(&mut ball, &mut backend, 1, &schedule);
        assert_eq!(first.node_count, 64);
        assert_eq!(second.node_count, 128);
        assert!(second.reinitialized);
        ball.teardown(&mut backend);
    }
}
