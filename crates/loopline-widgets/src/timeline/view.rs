//! Timeline view function
//!
//! ```ignore
//! fn view(&self) -> Element<Message> {
//!     let timeline = timeline_view(
//!         &self.timeline,
//!         &self.config.interaction.create_shortcut,
//!         Message::Timeline,
//!     );
//!     column![timeline, /* transport controls */].into()
//! }
//! ```

use super::canvas::TimelineCanvas;
use super::state::TimelineView;
use crate::interaction::TimelineInput;
use crate::theme::TIMELINE_HEIGHT;
use iced::widget::Canvas;
use iced::{Element, Length};

/// Create the loop timeline element
///
/// * `view` - segments, playhead and presentation state to draw
/// * `create_shortcut` - character key that creates a loop at the playhead
/// * `on_input` - wraps raw timeline input into the application's message
pub fn timeline_view<'a, Message>(
    view: &'a TimelineView,
    create_shortcut: &'a str,
    on_input: impl Fn(TimelineInput) -> Message + 'a,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    Canvas::new(TimelineCanvas {
        view,
        create_shortcut,
        on_input,
    })
    .width(Length::Fill)
    .height(Length::Fixed(TIMELINE_HEIGHT))
    .into()
}
