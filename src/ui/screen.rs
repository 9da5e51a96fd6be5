use ratatui::Frame;

use crate::{
    ui::{render_board, render_results},
    App, AppState,
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Board screen - targets, cursor and device messages while a session runs
pub struct BoardScreen;

impl Screen for BoardScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        render_board(app, area, f.buffer_mut());
    }
}

/// Results screen - outcome of the session that just ended
pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        render_results(app, area, f.buffer_mut());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Playing => Box::new(BoardScreen),
        AppState::Results => Box::new(ResultsScreen),
    }
}
