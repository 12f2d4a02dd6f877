//! Interactive drawing tools: the five-way tool mode, the in-progress
//! draft, the always-on vertex modify interaction, measurement, and the
//! toolbar/results overlays.

mod draw;
mod measure;
mod modify;
mod ui;

pub use draw::*;
pub use measure::*;
pub use modify::*;
pub use ui::*;

use bevy::prelude::*;
use bevy_egui::EguiPreUpdateSet;

pub struct ToolsPlugin;

impl Plugin for ToolsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ActiveTool::default())
            .insert_resource(Draft::default())
            .insert_resource(ModifyState::default())
            // Modify claims a contested press before draw sees it.
            .add_systems(Update, (handle_tool_change, handle_modify, handle_draw).chain())
            .add_systems(
                Update,
                (
                    toolbar_ui.after(EguiPreUpdateSet::InitContexts),
                    results_ui.after(EguiPreUpdateSet::InitContexts),
                ),
            );
    }
}

/// The mutually exclusive tool mode. `Select` installs no drawing
/// interaction; reshaping via the modify interaction is its only mutation.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTool {
    #[default]
    Select,
    Point,
    Line,
    Polygon,
    Circle,
}
