//! Envelope state machine and the envelope rasterizer driven through a
//! whole note: attack, sustain loop, release, finish.

use std::sync::Arc;

use mesh_raster::{
    dsp::{EnvMode, EnvStateMachine},
    graph::CapacitySpec,
    mesh::Mesh,
    synth::{EnvControlSnapshot, EnvRasterizer, RenderRequest},
};

#[test]
fn state_machine_golden_scenario() {
    let mut machine = EnvStateMachine::new();

    machine.note_on();
    assert_eq!(machine.mode(), EnvMode::Normal);
    assert!(!machine.release_pending());

    assert!(machine.transition_to_looping(true, true));
    assert_eq!(machine.mode(), EnvMode::Looping);

    assert!(machine.note_off(true));
    assert_eq!(machine.mode(), EnvMode::Releasing);
    assert!(machine.release_pending());

    assert!(machine.consume_release_trigger());
    assert_eq!(machine.mode(), EnvMode::Releasing);
    assert!(!machine.release_pending());
}

#[test]
fn state_machine_rejects_misuse() {
    let mut machine = EnvStateMachine::new();
    assert!(!machine.transition_to_looping(false, true));
    assert!(!machine.transition_to_looping(true, false));
    assert!(!machine.note_off(false));
    assert_eq!(machine.mode(), EnvMode::Normal);

    assert!(machine.note_off(true));
    assert!(!machine.note_off(true));
    assert!(!machine.transition_to_looping(true, true));

    // A fresh note clears the pending release
    machine.note_on();
    assert!(!machine.consume_release_trigger());
}

fn adsr() -> EnvRasterizer {
    let mut env = EnvRasterizer::new(CapacitySpec::for_intercepts(16));
    assert!(env.prepare());
    env.set_mesh_snapshot(Some(Arc::new(Mesh::from_points(&[
        (0.0, 0.0, 0.0),
        (0.1, 1.0, 0.8),
        (0.3, 0.6, 1.0),
        (0.7, 0.6, 1.0),
        (1.0, 0.0, 1.0),
    ]))));
    env.update_control_data(EnvControlSnapshot {
        loop_enabled: true,
        loop_start: 0.3,
        loop_end: 0.7,
        has_release_curve: true,
        release_start_x: 0.7,
        ..EnvControlSnapshot::default()
    });
    env
}

#[test]
fn full_note_lifecycle() {
    let mut env = adsr();
    let mut block = [0.0f32; 64];
    let request = RenderRequest::new(64, 0.005);

    env.note_on();
    assert_eq!(env.sample_position(), 0.0);

    // 64 * 0.005 = 0.32 per block; two blocks pass loop_end
    let mut peak = 0.0f32;
    for _ in 0..3 {
        let result = env.render_audio(&request, &mut block);
        assert!(result.rendered && result.still_active);
        peak = block.iter().fold(peak, |p, &s| p.max(s));
    }
    assert!(peak > 0.8);
    assert_eq!(env.mode(), EnvMode::Looping);

    // Sustain: the plateau holds while looping
    for _ in 0..10 {
        env.render_audio(&request, &mut block);
        assert!((0.3..0.7).contains(&env.sample_position()));
        assert!(block.iter().all(|s| (s - 0.6).abs() < 0.05));
    }

    assert!(env.note_off());
    let result = env.render_audio(&RenderRequest::new(32, 0.005), &mut block);
    assert_eq!(env.mode(), EnvMode::Releasing);
    assert!((block[0] - 0.6).abs() < 0.05);
    assert!(result.still_active);

    // Release runs out at max_x
    let result = env.render_audio(&request, &mut block);
    assert!(!result.still_active);
    assert!(block[63].abs() < 0.05);
}

#[test]
fn tempo_sync_and_gain_shape_the_block() {
    let mut env = adsr();
    env.note_on();

    let mut plain = [0.0f32; 32];
    env.render_audio(&RenderRequest::new(32, 0.004), &mut plain);
    let plain_position = env.sample_position();

    env.note_on();
    let mut synced = [0.0f32; 32];
    let request = RenderRequest {
        tempo_sync: true,
        tempo_scale: 2.0,
        scale: 0.5,
        ..RenderRequest::new(32, 0.002)
    };
    env.render_audio(&request, &mut synced);

    assert!((env.sample_position() - plain_position).abs() < 1e-9);
    for (p, s) in plain.iter().zip(&synced) {
        assert!((p * 0.5 - s).abs() < 1e-6);
    }
}

#[test]
fn invalid_request_renders_silence() {
    let mut env = adsr();
    env.note_on();
    let mut block = [1.0f32; 16];
    let result = env.render_audio(&RenderRequest::new(32, 0.01), &mut block);
    assert!(!result.rendered);
    assert_eq!(result.samples_written, 0);
    assert!(block.iter().all(|&s| s == 0.0));
}
