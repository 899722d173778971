use ratatui::{layout::Rect, Frame};

use crate::{ui, App, AppScreen};

/// A UI Screen boundary: renders its body and names its keys
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect);
    fn help(&self) -> &'static str;
}

pub struct DashboardScreen;

impl Screen for DashboardScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        ui::dashboard::render_dashboard(app, f, area);
    }

    fn help(&self) -> &'static str {
        "←/→ day | (t)oday | Tab shift | (e)dit | (p)ush | s(y)nc | (b)ell | (c)heck | (q)uit"
    }
}

pub struct EditorScreen;

impl Screen for EditorScreen {
    fn render(&self, app: &App, f: &mut Frame, area: Rect) {
        ui::editor::render_editor(app, f, area);
    }

    fn help(&self) -> &'static str {
        "↑↓ select  [ ] start  - + end  S/E/n type  a add  d del  x lesson  o day  s save  Esc"
    }
}

pub fn current_screen(screen: AppScreen) -> Box<dyn Screen> {
    match screen {
        AppScreen::Dashboard => Box::new(DashboardScreen),
        AppScreen::Editor => Box::new(EditorScreen),
    }
}
