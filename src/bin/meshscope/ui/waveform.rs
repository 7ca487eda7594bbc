//! Chart widgets: the live oscilloscope and the rasterized curve

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

fn axis(bounds: [f64; 2]) -> Axis<'static> {
    Axis::default()
        .bounds(bounds)
        .style(Style::default().fg(Color::DarkGray))
}

/// Render the output oscilloscope
pub fn render_scope(frame: &mut Frame, area: Rect, audio_buffer: &[f32]) {
    let len = audio_buffer.len().max(1) as f64;
    let data: Vec<(f64, f64)> = audio_buffer
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64 / len, sample as f64))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(" Output ").borders(Borders::ALL))
        .x_axis(axis([0.0, 1.0]))
        .y_axis(axis([-1.0, 1.0]));

    frame.render_widget(chart, area);
}

/// Render one cycle of the rasterized wave with its control points on top
pub fn render_curve(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    curve: &[(f64, f64)],
    intercepts: &[(f64, f64)],
) {
    let line = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Yellow))
        .data(curve);
    let points = Dataset::default()
        .marker(symbols::Marker::Dot)
        .graph_type(GraphType::Scatter)
        .style(Style::default().fg(Color::Magenta))
        .data(intercepts);

    let chart = Chart::new(vec![line, points])
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(axis([0.0, 1.0]))
        .y_axis(axis([-1.0, 1.0]));

    frame.render_widget(chart, area);
}
