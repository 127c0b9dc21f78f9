//! Canvas Program for the loop timeline
//!
//! Translates iced mouse, touch, keyboard and window events into
//! [`TimelineInput`]s through the `on_input` callback and draws the
//! [`TimelineView`]. Gesture logic lives in the interaction controller.

use super::state::TimelineView;
use crate::interaction::{Hit, Phase, Pointer, PointerKind, TimelineInput, TimelineKey};
use crate::theme::{
    segment_fill, BACKGROUND_COLOR, HANDLE_COLOR, HANDLE_HOVER_COLOR, LABEL_COLOR, PLAYHEAD_COLOR,
    PREVIEW_COLLIDING_COLOR, PREVIEW_COLOR, SEGMENT_BAND_HEIGHT, SELECTED_OUTLINE_COLOR,
    TRACK_COLOR,
};
use iced::widget::canvas::{self, Event, Frame, Geometry, Path, Program, Stroke};
use iced::{keyboard, mouse, touch, window, Point, Rectangle, Size, Theme};
use loopline_core::timeline::time_to_x;
use loopline_core::SegmentId;
use std::time::Instant;

/// Drawn width of a resize handle
const HANDLE_DRAW_WIDTH: f32 = 3.0;

/// Canvas state for pointer capture and input timing
#[derive(Debug, Clone, Copy, Default)]
pub struct TimelineInteraction {
    /// A gesture started on the timeline; keep following the pointer outside it
    pub captured: bool,
    /// Whether the mouse was over the timeline on the last move
    pub hovering: bool,
    /// Finger driving the current touch gesture
    pub finger: Option<touch::Finger>,
    pub modifiers: keyboard::Modifiers,
    /// Reference point for input timestamps
    pub epoch: Option<Instant>,
}

impl TimelineInteraction {
    fn now_ms(&mut self) -> u64 {
        self.epoch.get_or_insert_with(Instant::now).elapsed().as_millis() as u64
    }

    fn pointer(&mut self, x: f32, bounds: Rectangle, kind: PointerKind) -> Pointer {
        Pointer {
            x: x as f64,
            width: bounds.width as f64,
            kind,
            at_ms: self.now_ms(),
            force_create: self.modifiers.shift(),
        }
    }
}

/// Canvas program for the loop timeline
///
/// `create_shortcut` is the character key that creates a loop at the playhead.
pub struct TimelineCanvas<'a, Message, F>
where
    F: Fn(TimelineInput) -> Message,
{
    pub view: &'a TimelineView,
    pub create_shortcut: &'a str,
    pub on_input: F,
}

impl<'a, Message, F> TimelineCanvas<'a, Message, F>
where
    F: Fn(TimelineInput) -> Message,
{
    fn publish(&self, input: TimelineInput) -> Option<canvas::Action<Message>> {
        Some(canvas::Action::publish((self.on_input)(input)))
    }

    fn translate_key(&self, key: &keyboard::Key, modifiers: keyboard::Modifiers) -> Option<TimelineKey> {
        use keyboard::key::Named;

        match key {
            keyboard::Key::Named(Named::Escape) => Some(TimelineKey::Escape),
            keyboard::Key::Named(Named::Delete) => Some(TimelineKey::Delete),
            keyboard::Key::Named(Named::Backspace) => Some(TimelineKey::Backspace),
            keyboard::Key::Character(c)
                if !modifiers.control()
                    && !modifiers.alt()
                    && !modifiers.logo()
                    && c.as_str().eq_ignore_ascii_case(self.create_shortcut) =>
            {
                Some(TimelineKey::CreateLoop)
            }
            _ => None,
        }
    }
}

impl<'a, Message, F> Program<Message> for TimelineCanvas<'a, Message, F>
where
    Message: Clone,
    F: Fn(TimelineInput) -> Message,
{
    type State = TimelineInteraction;

    fn update(
        &self,
        interaction: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        match event {
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let position = cursor.position_in(bounds)?;
                interaction.captured = true;
                let pointer = interaction.pointer(position.x, bounds, PointerKind::Mouse);
                self.publish(TimelineInput::PointerDown(pointer))
            }
            Event::Mouse(mouse::Event::CursorMoved { position }) => {
                let inside = bounds.contains(*position);
                if interaction.captured || inside {
                    interaction.hovering = inside;
                    let pointer = interaction.pointer(position.x - bounds.x, bounds, PointerKind::Mouse);
                    self.publish(TimelineInput::PointerMove(pointer))
                } else if interaction.hovering {
                    interaction.hovering = false;
                    self.publish(TimelineInput::PointerLeft)
                } else {
                    None
                }
            }
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if !interaction.captured {
                    return None;
                }
                interaction.captured = false;
                let x = cursor.position().map_or(0.0, |p| p.x - bounds.x);
                let pointer = interaction.pointer(x, bounds, PointerKind::Mouse);
                self.publish(TimelineInput::PointerUp(pointer))
            }
            Event::Mouse(mouse::Event::CursorLeft) => {
                if interaction.captured || !interaction.hovering {
                    return None;
                }
                interaction.hovering = false;
                self.publish(TimelineInput::PointerLeft)
            }
            Event::Touch(touch::Event::FingerPressed { id, position }) => {
                if interaction.finger.is_some() || !bounds.contains(*position) {
                    return None;
                }
                interaction.finger = Some(*id);
                interaction.captured = true;
                let pointer = interaction.pointer(position.x - bounds.x, bounds, PointerKind::Touch);
                self.publish(TimelineInput::PointerDown(pointer))
            }
            Event::Touch(touch::Event::FingerMoved { id, position }) if interaction.finger == Some(*id) => {
                let pointer = interaction.pointer(position.x - bounds.x, bounds, PointerKind::Touch);
                self.publish(TimelineInput::PointerMove(pointer))
            }
            Event::Touch(touch::Event::FingerLifted { id, position }) if interaction.finger == Some(*id) => {
                interaction.finger = None;
                interaction.captured = false;
                let pointer = interaction.pointer(position.x - bounds.x, bounds, PointerKind::Touch);
                self.publish(TimelineInput::PointerUp(pointer))
            }
            Event::Touch(touch::Event::FingerLost { id, .. }) if interaction.finger == Some(*id) => {
                interaction.finger = None;
                interaction.captured = false;
                self.publish(TimelineInput::PointerCancel)
            }
            Event::Keyboard(keyboard::Event::ModifiersChanged(modifiers)) => {
                interaction.modifiers = *modifiers;
                None
            }
            Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }) => {
                let key = self.translate_key(key, *modifiers)?;
                self.publish(TimelineInput::Key(key))
            }
            Event::Window(window::Event::Unfocused) => {
                interaction.captured = false;
                interaction.finger = None;
                interaction.hovering = false;
                self.publish(TimelineInput::Blur)
            }
            _ => None,
        }
    }

    fn mouse_interaction(
        &self,
        interaction: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        match self.view.phase {
            Phase::DraggingMove => return mouse::Interaction::Grabbing,
            Phase::DraggingResizeLeft | Phase::DraggingResizeRight => {
                return mouse::Interaction::ResizingHorizontally
            }
            Phase::CreatingLoop => return mouse::Interaction::Crosshair,
            Phase::Seeking | Phase::Idle => {}
        }

        if !interaction.captured && !cursor.is_over(bounds) {
            return mouse::Interaction::default();
        }
        match self.view.hover {
            Some(Hit::LeftHandle(_)) | Some(Hit::RightHandle(_)) => mouse::Interaction::ResizingHorizontally,
            Some(Hit::Body(_)) => mouse::Interaction::Grab,
            _ => mouse::Interaction::Pointer,
        }
    }

    fn draw(
        &self,
        _interaction: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), BACKGROUND_COLOR);

        let width = bounds.width;
        let height = bounds.height;
        let band_top = (height - SEGMENT_BAND_HEIGHT) / 2.0;
        frame.fill_rectangle(
            Point::new(0.0, band_top),
            Size::new(width, SEGMENT_BAND_HEIGHT),
            TRACK_COLOR,
        );

        let duration = self.view.duration;
        if duration <= 0.0 {
            return vec![frame.into_geometry()];
        }
        let to_x = |time: f64| time_to_x(time, width as f64, duration) as f32;

        for segment in &self.view.segments {
            let (start, end) = self.view.displayed_bounds(segment);
            let (x0, x1) = (to_x(start), to_x(end));
            let active = self.view.active == Some(segment.id);
            let selected = self.view.selected == Some(segment.id);

            frame.fill_rectangle(
                Point::new(x0, band_top),
                Size::new((x1 - x0).max(1.0), SEGMENT_BAND_HEIGHT),
                segment_fill(&segment.color, active),
            );

            if selected {
                frame.stroke(
                    &Path::rectangle(Point::new(x0, band_top), Size::new(x1 - x0, SEGMENT_BAND_HEIGHT)),
                    Stroke::default().with_color(SELECTED_OUTLINE_COLOR).with_width(2.0),
                );
            }

            draw_handles(&mut frame, segment.id, x0, x1, band_top, self.view.hover);
            draw_label(&mut frame, &segment.name, x0, x1, band_top);
        }

        // Creation preview (drag previews move the segment itself)
        if let Some(preview) = self.view.preview.filter(|p| p.id.is_none()) {
            let (x0, x1) = (to_x(preview.start), to_x(preview.end));
            let color = if preview.colliding {
                PREVIEW_COLLIDING_COLOR
            } else {
                PREVIEW_COLOR
            };
            frame.fill_rectangle(
                Point::new(x0, band_top),
                Size::new((x1 - x0).max(1.0), SEGMENT_BAND_HEIGHT),
                color,
            );
        }

        let playhead_x = to_x(self.view.playhead);
        frame.stroke(
            &Path::line(Point::new(playhead_x, 0.0), Point::new(playhead_x, height)),
            Stroke::default().with_color(PLAYHEAD_COLOR).with_width(2.0),
        );

        vec![frame.into_geometry()]
    }
}

fn draw_handles(frame: &mut Frame, id: SegmentId, x0: f32, x1: f32, top: f32, hover: Option<Hit>) {
    let left_color = if hover == Some(Hit::LeftHandle(id)) {
        HANDLE_HOVER_COLOR
    } else {
        HANDLE_COLOR
    };
    let right_color = if hover == Some(Hit::RightHandle(id)) {
        HANDLE_HOVER_COLOR
    } else {
        HANDLE_COLOR
    };
    let size = Size::new(HANDLE_DRAW_WIDTH, SEGMENT_BAND_HEIGHT);
    frame.fill_rectangle(Point::new(x0, top), size, left_color);
    frame.fill_rectangle(Point::new(x1 - HANDLE_DRAW_WIDTH, top), size, right_color);
}

fn draw_label(frame: &mut Frame, name: &str, x0: f32, x1: f32, top: f32) {
    use iced::alignment::{Horizontal, Vertical};
    use iced::widget::canvas::Text;

    // Skip labels that would not fit
    if x1 - x0 < 30.0 {
        return;
    }
    frame.fill_text(Text {
        content: name.to_string(),
        position: Point::new(x0 + 6.0, top + SEGMENT_BAND_HEIGHT / 2.0),
        size: 11.0.into(),
        color: LABEL_COLOR,
        align_x: Horizontal::Left.into(),
        align_y: Vertical::Center.into(),
        ..Text::default()
    });
}
