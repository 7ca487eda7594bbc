//! TUI module for meshscope
//!
//! Draws the rasterized curve at the current morph position next to what
//! the synth is actually playing, and turns key presses into messages for
//! the audio thread.

mod spectrum;
mod state;
mod waveform;

use color_eyre::eyre::{eyre, Result as EyreResult};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use std::{sync::Arc, time::Duration};

use mesh_raster::{
    graph::CapacitySpec,
    mesh::MeshSource,
    synth::{GraphicRasterizer, GraphicRequest, RasterMessage},
};

pub use state::ScopeState;

use spectrum::{render_spectrum, SpectrumAnalyzer};
use waveform::{render_curve, render_scope};

/// Audio visualization buffer size
pub const VIS_BUFFER_SIZE: usize = 1024;

/// Points drawn for one cycle of the curve
const CURVE_POINTS: usize = 256;

pub struct UiApp {
    audio_rx: Consumer<f32>,
    msg_tx: Producer<RasterMessage>,
    graphic: GraphicRasterizer,
    state: ScopeState,
    audio_buffer: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    curve: Vec<(f64, f64)>,
    intercepts: Vec<(f64, f64)>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        audio_rx: Consumer<f32>,
        msg_tx: Producer<RasterMessage>,
        mesh: Arc<dyn MeshSource>,
        state: ScopeState,
    ) -> EyreResult<Self> {
        let mut graphic = GraphicRasterizer::new(CapacitySpec::for_intercepts(32));
        if !graphic.prepare() {
            return Err(eyre!("could not prepare the curve display"));
        }
        graphic.set_mesh_snapshot(Some(mesh));
        graphic.update_control_data(state.voice_controls());

        let mut app = Self {
            audio_rx,
            msg_tx,
            graphic,
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, state.sample_rate),
            state,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            curve: Vec::with_capacity(CURVE_POINTS),
            intercepts: Vec::new(),
            should_quit: false,
        };
        app.redraw_curve();
        Ok(app)
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            terminal.draw(|frame| self.render(frame))?;

            // Handle keyboard input (non-blocking, ~60fps)
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        // Leave nothing ringing behind
        self.send(RasterMessage::AllNotesOff);
        Ok(())
    }

    /// Keep the last VIS_BUFFER_SIZE samples from the audio thread
    fn poll_audio(&mut self) {
        let available = self.audio_rx.slots();
        if available == 0 {
            return;
        }
        while let Ok(sample) = self.audio_rx.pop() {
            self.audio_buffer.push(sample);
        }
        if self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
        self.spectrum.update(&self.audio_buffer);
    }

    fn handle_key(&mut self, key: KeyCode) {
        let message = match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char(' ') => Some(self.state.release_all()),
            KeyCode::Left => Some(self.state.nudge_morph(0.0, -1.0, 0.0)),
            KeyCode::Right => Some(self.state.nudge_morph(0.0, 1.0, 0.0)),
            KeyCode::Down => Some(self.state.nudge_morph(0.0, 0.0, -1.0)),
            KeyCode::Up => Some(self.state.nudge_morph(0.0, 0.0, 1.0)),
            KeyCode::Char('[') => Some(self.state.nudge_morph(-1.0, 0.0, 0.0)),
            KeyCode::Char(']') => Some(self.state.nudge_morph(1.0, 0.0, 0.0)),
            KeyCode::Char('i') => Some(self.state.cycle_interpolation()),
            KeyCode::Char('l') => Some(self.state.toggle_low_resolution()),
            KeyCode::Char(c) => self.state.toggle_key(c),
            _ => None,
        };

        if let Some(message) = message {
            self.send(message);
            self.graphic.update_control_data(self.state.voice_controls());
            self.redraw_curve();
        }
    }

    fn send(&mut self, message: RasterMessage) {
        // A full queue means the audio thread stalled; the key press is lost
        let _ = self.msg_tx.push(message);
    }

    /// Rasterize one cycle at the current morph position
    fn redraw_curve(&mut self) {
        let mut points = [0.0f32; CURVE_POINTS];
        let result = self
            .graphic
            .render_graphic(&GraphicRequest::new(CURVE_POINTS, 0.0, 1.0), &mut points);

        self.curve.clear();
        self.intercepts.clear();
        if !result.rendered {
            return;
        }
        let step = 1.0 / (CURVE_POINTS - 1) as f64;
        self.curve.extend(
            points
                .iter()
                .enumerate()
                .map(|(i, &y)| (i as f64 * step, y as f64)),
        );
        // Positioned intercepts are already scaled
        self.intercepts.extend(
            self.graphic
                .intercepts()
                .iter()
                .map(|icpt| (icpt.x as f64, icpt.y as f64)),
        );
    }

    fn render(&self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(10),    // Curve
                Constraint::Length(10), // Output + spectrum
                Constraint::Length(1),  // Status
                Constraint::Length(1),  // Help bar
            ])
            .split(frame.area());
        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        let morph = self.state.morph;
        let title = format!(
            " Curve  time {:.2}  red {:.2}  blue {:.2} ",
            morph.time, morph.red, morph.blue
        );
        render_curve(frame, rows[0], &title, &self.curve, &self.intercepts);
        render_scope(frame, bottom[0], &self.audio_buffer);
        render_spectrum(frame, bottom[1], self.spectrum.data());

        let notes: Vec<String> = self.state.held_notes().map(|n| n.to_string()).collect();
        let status = format!(
            " {:?}{}  notes [{}]",
            self.state.interpolation,
            if self.state.low_resolution { "  low-res" } else { "" },
            notes.join(" ")
        );
        frame.render_widget(Paragraph::new(status), rows[2]);

        let help = Paragraph::new(
            " [A-K] Notes  [Space] Release all  [←→] Red  [↑↓] Blue  [ [ ] ] Time  [I] Interp  [L] Low-res  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[3]);
    }
}
