//! Headless demo driving the selection marker against the recording context
//!
//! Run with:
//!   cargo run --example headless
//!   cargo run --example headless -- --model assets/cube.obj --frames 120
//!
//! Simulates a short input script (move, select, release) at a fixed frame
//! rate and logs the marker state every time the blink fires.

use board_cursor::backend::RecordingContext;
use board_cursor::{MarkerConfig, SelectionMarker};
use clap::Parser;
use glam::{Mat4, Vec3};
use std::path::PathBuf;
use std::time::Duration;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "headless")]
#[command(about = "Drive the selection marker without a window")]
struct Args {
    /// OBJ model to load
    #[arg(short, long, default_value = "assets/select.obj")]
    model: PathBuf,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 90)]
    frames: u32,

    /// Frame time in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Board step applied by each simulated key press
    #[arg(long, default_value_t = 0.2)]
    step: f32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut ctx = RecordingContext::new();
    let program = ctx.register_program(
        &[("inPosition", 0)],
        &["viewMatrix", "projMatrix", "modelMatrix", "color"],
    );

    let config = MarkerConfig::default().with_model_path(&args.model);
    let mut marker = match SelectionMarker::initialize(&mut ctx, program, config) {
        Ok(marker) => marker,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };

    let view = Mat4::look_at_rh(Vec3::new(0.0, 2.5, 2.5), Vec3::ZERO, Vec3::Y);
    let projection = Mat4::perspective_rh_gl(45f32.to_radians(), 16.0 / 9.0, 0.1, 10.0);
    marker.upload_camera(&mut ctx, &view, &projection);

    let frame = Duration::from_millis(args.frame_ms);
    for index in 0..args.frames {
        // Scripted input: walk right, walk down, select, release
        match index % 60 {
            10 => {
                if !marker.move_x(args.step) {
                    log::info!("frame {}: move along X blocked by the board edge", index);
                }
            }
            20 => {
                if !marker.move_z(-args.step) {
                    log::info!("frame {}: move along Z blocked by the board edge", index);
                }
            }
            30 => marker.set_selected(true),
            45 => marker.set_selected(false),
            _ => {}
        }

        if marker.advance_frame(frame) {
            let state = marker.state();
            log::info!(
                "frame {}: {:?} at {:?} color {:?}",
                index,
                state.status(),
                state.position(),
                state.color()
            );
        }
        marker.render(&mut ctx);
    }

    marker.teardown(&mut ctx);
    log::info!(
        "{} draw calls, {} buffers and {} vertex arrays still live, {} context errors",
        ctx.draw_call_count(),
        ctx.live_buffer_count(),
        ctx.live_vertex_array_count(),
        ctx.errors().len()
    );
}
