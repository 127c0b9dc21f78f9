//! Timeline gesture state machine

use super::{
    hit_test, Edge, Hit, InteractionContext, Intent, Phase, Pointer, PointerKind, Preview,
    TimelineInput, TimelineKey,
};
use loopline_core::config::{InteractionConfig, LooplineConfig, TimelineConfig};
use loopline_core::error::SegmentError;
use loopline_core::timeline::{
    delta_x_to_time, fit_within_track, validate_with_min, x_to_time, CollisionEngine,
};
use loopline_core::SegmentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Move,
    ResizeLeft,
    ResizeRight,
}

impl DragMode {
    fn from_hit(hit: Hit) -> Option<(SegmentId, DragMode)> {
        match hit {
            Hit::Empty => None,
            Hit::Body(id) => Some((id, DragMode::Move)),
            Hit::LeftHandle(id) => Some((id, DragMode::ResizeLeft)),
            Hit::RightHandle(id) => Some((id, DragMode::ResizeRight)),
        }
    }

    fn phase(self) -> Phase {
        match self {
            DragMode::Move => Phase::DraggingMove,
            DragMode::ResizeLeft => Phase::DraggingResizeLeft,
            DragMode::ResizeRight => Phase::DraggingResizeRight,
        }
    }
}

/// Where a gesture started and how far it has strayed
#[derive(Debug, Clone, Copy, PartialEq)]
struct Press {
    kind: PointerKind,
    anchor_x: f64,
    started_ms: u64,
    /// Largest distance from the anchor so far (px)
    max_offset: f64,
}

impl Press {
    fn new(pointer: &Pointer) -> Self {
        Self {
            kind: pointer.kind,
            anchor_x: pointer.x,
            started_ms: pointer.at_ms,
            max_offset: 0.0,
        }
    }

    fn track(&mut self, pointer: &Pointer) {
        self.max_offset = self.max_offset.max((pointer.x - self.anchor_x).abs());
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    id: SegmentId,
    mode: DragMode,
    press: Press,
    initial_start: f64,
    initial_end: f64,
    /// Last collision-free bounds
    start: f64,
    end: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CreateState {
    press: Press,
    anchor_time: f64,
    current_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Seeking(Press),
    Creating(CreateState),
    Dragging(DragState),
}

impl Gesture {
    fn press(&self) -> Option<&Press> {
        match self {
            Gesture::Idle => None,
            Gesture::Seeking(press) => Some(press),
            Gesture::Creating(create) => Some(&create.press),
            Gesture::Dragging(drag) => Some(&drag.press),
        }
    }
}

/// A click or tap on empty track, remembered for double-activation
#[derive(Debug, Clone, Copy, PartialEq)]
struct Activation {
    at_ms: u64,
    x: f64,
}

/// Turns pointer, touch and keyboard input into segment intents
#[derive(Debug, Clone)]
pub struct InteractionController {
    config: InteractionConfig,
    min_duration: f64,
    default_length: f64,
    collisions: CollisionEngine,
    gesture: Gesture,
    selected: Option<SegmentId>,
    hover: Option<Hit>,
    preview: Option<Preview>,
    touch_down: bool,
    last_touch_end_ms: Option<u64>,
    last_activation: Option<Activation>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::from_config(&LooplineConfig::default())
    }
}

impl InteractionController {
    pub fn new(interaction: &InteractionConfig, timeline: &TimelineConfig) -> Self {
        Self {
            config: interaction.clone(),
            min_duration: timeline.min_segment_duration,
            default_length: timeline.default_segment_length,
            collisions: CollisionEngine::new(timeline.adjacency),
            gesture: Gesture::Idle,
            selected: None,
            hover: None,
            preview: None,
            touch_down: false,
            last_touch_end_ms: None,
            last_activation: None,
        }
    }

    pub fn from_config(config: &LooplineConfig) -> Self {
        Self::new(&config.interaction, &config.timeline)
    }

    pub fn phase(&self) -> Phase {
        match self.gesture {
            Gesture::Idle => Phase::Idle,
            Gesture::Seeking(_) => Phase::Seeking,
            Gesture::Creating(_) => Phase::CreatingLoop,
            Gesture::Dragging(drag) => drag.mode.phase(),
        }
    }

    pub fn selected(&self) -> Option<SegmentId> {
        self.selected
    }

    pub fn hover(&self) -> Option<Hit> {
        self.hover
    }

    /// The live range of the gesture in progress, if it has one
    pub fn preview(&self) -> Option<Preview> {
        self.preview
    }

    pub fn creation_enabled(&self) -> bool {
        self.config.creation_enabled
    }

    pub fn set_creation_enabled(&mut self, enabled: bool) {
        self.config.creation_enabled = enabled;
    }

    /// Forget a segment removed by someone else
    pub fn on_segment_deleted(&mut self, id: SegmentId) {
        if self.selected == Some(id) {
            self.selected = None;
        }
        if matches!(self.gesture, Gesture::Dragging(drag) if drag.id == id) {
            self.gesture = Gesture::Idle;
            self.preview = None;
        }
    }

    /// Feed one input; returns what the owner should do, in order
    pub fn handle(&mut self, input: TimelineInput, ctx: &InteractionContext<'_>) -> Vec<Intent> {
        let mut out = Vec::new();
        match input {
            TimelineInput::PointerDown(pointer) => self.pointer_down(&pointer, ctx, &mut out),
            TimelineInput::PointerMove(pointer) => self.pointer_move(&pointer, ctx, &mut out),
            TimelineInput::PointerUp(pointer) => self.pointer_up(&pointer, ctx, &mut out),
            TimelineInput::PointerLeft => {
                if self.gesture == Gesture::Idle {
                    self.set_hover(None, &mut out);
                }
            }
            TimelineInput::PointerCancel => {
                self.touch_down = false;
                self.cancel(&mut out);
            }
            TimelineInput::Blur => {
                self.touch_down = false;
                self.cancel(&mut out);
                self.set_hover(None, &mut out);
            }
            TimelineInput::Key(key) => self.key(key, ctx, &mut out),
        }
        out
    }

    // --- Pointer ---

    /// Mouse input is ignored while a touch is down and shortly after it ends
    fn is_synthetic_mouse(&self, pointer: &Pointer) -> bool {
        if pointer.kind != PointerKind::Mouse {
            return false;
        }
        self.touch_down
            || self.last_touch_end_ms.is_some_and(|end| {
                pointer.at_ms.saturating_sub(end) < self.config.synthetic_mouse_guard_ms
            })
    }

    fn slop(&self, kind: PointerKind) -> f64 {
        match kind {
            PointerKind::Mouse => self.config.click_slop_px,
            PointerKind::Touch => self.config.tap_slop_px,
        }
    }

    /// Whether a finished press stayed a click (mouse) or tap (touch)
    fn is_click(&self, press: &Press, released_ms: u64) -> bool {
        if press.max_offset > self.slop(press.kind) {
            return false;
        }
        match press.kind {
            PointerKind::Mouse => true,
            PointerKind::Touch => released_ms.saturating_sub(press.started_ms) < self.config.tap_max_ms,
        }
    }

    fn pointer_down(&mut self, pointer: &Pointer, ctx: &InteractionContext<'_>, out: &mut Vec<Intent>) {
        if self.is_synthetic_mouse(pointer) {
            log::debug!("InteractionController: ignoring synthetic mouse press");
            return;
        }
        if self.gesture != Gesture::Idle {
            log::debug!("InteractionController: press ignored during {:?}", self.phase());
            return;
        }
        if pointer.kind == PointerKind::Touch {
            self.touch_down = true;
        }
        if ctx.duration <= 0.0 || pointer.width <= 0.0 {
            return;
        }

        let time = x_to_time(pointer.x, pointer.width, ctx.duration);
        let hit = hit_test(
            pointer.x,
            pointer.width,
            ctx.duration,
            ctx.segments,
            self.config.handle_width_px,
        );
        let press = Press::new(pointer);

        if pointer.force_create || (hit == Hit::Empty && self.config.creation_enabled) {
            self.gesture = Gesture::Creating(CreateState {
                press,
                anchor_time: time,
                current_time: time,
            });
        } else if let Some((id, mode)) = DragMode::from_hit(hit) {
            let Some(segment) = ctx.segments.iter().find(|s| s.id == id) else {
                return;
            };
            self.gesture = Gesture::Dragging(DragState {
                id,
                mode,
                press,
                initial_start: segment.start_time,
                initial_end: segment.end_time,
                start: segment.start_time,
                end: segment.end_time,
            });
            self.select(Some(id), out);
        } else {
            self.gesture = Gesture::Seeking(press);
            out.push(Intent::Seek(time));
            self.select(None, out);
        }

        log::debug!("InteractionController: {:?} at {:.3}s ({:?})", self.phase(), time, hit);
        out.push(Intent::CapturePointer);
        out.push(Intent::PhaseChanged(self.phase()));
    }

    fn pointer_move(&mut self, pointer: &Pointer, ctx: &InteractionContext<'_>, out: &mut Vec<Intent>) {
        if self.is_synthetic_mouse(pointer) {
            return;
        }
        if let Some(press) = self.gesture.press() {
            if press.kind != pointer.kind {
                return;
            }
        }

        match self.gesture {
            Gesture::Idle => {
                if pointer.kind == PointerKind::Mouse && ctx.duration > 0.0 {
                    let hit = hit_test(
                        pointer.x,
                        pointer.width,
                        ctx.duration,
                        ctx.segments,
                        self.config.handle_width_px,
                    );
                    self.set_hover(Some(hit), out);
                }
            }
            Gesture::Seeking(mut press) => {
                press.track(pointer);
                self.gesture = Gesture::Seeking(press);
                out.push(Intent::Seek(x_to_time(pointer.x, pointer.width, ctx.duration)));
            }
            Gesture::Creating(mut create) => {
                create.press.track(pointer);
                create.current_time = x_to_time(pointer.x, pointer.width, ctx.duration);
                self.gesture = Gesture::Creating(create);
                if create.press.max_offset > self.slop(create.press.kind) {
                    let preview = self.creation_preview(&create, ctx);
                    self.show_preview(preview, out);
                }
            }
            Gesture::Dragging(mut drag) => {
                if !ctx.segments.iter().any(|s| s.id == drag.id) {
                    log::debug!("InteractionController: {} vanished mid-drag", drag.id);
                    self.cancel(out);
                    return;
                }
                drag.press.track(pointer);
                let (start, end) = self.drag_candidate(&drag, pointer, ctx.duration);
                let moved = start != drag.start || end != drag.end;
                if moved && !self.collisions.check_overlap(Some(drag.id), start, end, ctx.segments) {
                    drag.start = start;
                    drag.end = end;
                    self.show_preview(
                        Preview {
                            id: Some(drag.id),
                            start,
                            end,
                            colliding: false,
                        },
                        out,
                    );
                }
                self.gesture = Gesture::Dragging(drag);
            }
        }
    }

    fn pointer_up(&mut self, pointer: &Pointer, ctx: &InteractionContext<'_>, out: &mut Vec<Intent>) {
        if pointer.kind == PointerKind::Touch {
            self.touch_down = false;
            self.last_touch_end_ms = Some(pointer.at_ms);
        } else if self.is_synthetic_mouse(pointer) {
            return;
        }
        match self.gesture.press() {
            Some(press) if press.kind == pointer.kind => {}
            _ => return,
        }

        // Let the release position count as a final move
        self.pointer_move(pointer, ctx, out);

        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => return,
            Gesture::Seeking(press) => {
                if self.is_click(&press, pointer.at_ms) {
                    let time = x_to_time(pointer.x, pointer.width, ctx.duration);
                    self.register_activation(pointer, time, ctx, out);
                }
            }
            Gesture::Creating(create) => self.finish_create(&create, pointer, ctx, out),
            Gesture::Dragging(drag) => self.finish_drag(&drag, pointer.at_ms, out),
        }

        self.clear_preview(out);
        out.push(Intent::ReleasePointer);
        out.push(Intent::PhaseChanged(Phase::Idle));
    }

    fn finish_create(&mut self, create: &CreateState, pointer: &Pointer, ctx: &InteractionContext<'_>, out: &mut Vec<Intent>) {
        if self.is_click(&create.press, pointer.at_ms) {
            out.push(Intent::Seek(create.anchor_time));
            self.select(None, out);
            self.register_activation(pointer, create.anchor_time, ctx, out);
            return;
        }
        if create.press.max_offset <= self.slop(create.press.kind) {
            // Long touch without movement
            return;
        }

        let start = create.anchor_time.min(create.current_time);
        let end = create.anchor_time.max(create.current_time);
        if end - start < self.min_duration {
            log::debug!("InteractionController: {:.3}s loop too short, discarded", end - start);
            return;
        }
        if !validate_with_min(start, end, ctx.duration, self.min_duration).is_valid {
            log::debug!("InteractionController: [{:.3}, {:.3}] out of bounds, discarded", start, end);
            return;
        }
        if self.collisions.check_overlap(None, start, end, ctx.segments) {
            log::debug!("InteractionController: [{:.3}, {:.3}] collides, discarded", start, end);
            return;
        }
        out.push(Intent::CreateLoop { start, end });
    }

    fn finish_drag(&mut self, drag: &DragState, released_ms: u64, out: &mut Vec<Intent>) {
        // A click or tap on a segment only selects it
        if self.is_click(&drag.press, released_ms) {
            return;
        }
        if drag.start == drag.initial_start && drag.end == drag.initial_end {
            return;
        }
        let (id, start, end) = (drag.id, drag.start, drag.end);
        out.push(match drag.mode {
            DragMode::Move => Intent::MoveLoop { id, start, end },
            DragMode::ResizeLeft => Intent::ResizeLoop { id, edge: Edge::Left, start, end },
            DragMode::ResizeRight => Intent::ResizeLoop { id, edge: Edge::Right, start, end },
        });
    }

    /// Bounds for a drag at `pointer`, clamped to the track and minimum length
    fn drag_candidate(&self, drag: &DragState, pointer: &Pointer, duration: f64) -> (f64, f64) {
        let dt = delta_x_to_time(pointer.x - drag.press.anchor_x, pointer.width, duration);
        match drag.mode {
            DragMode::Move => {
                let length = drag.initial_end - drag.initial_start;
                let start = (drag.initial_start + dt).clamp(0.0, (duration - length).max(0.0));
                (start, start + length)
            }
            DragMode::ResizeLeft => {
                let latest = (drag.initial_end - self.min_duration).max(0.0);
                ((drag.initial_start + dt).clamp(0.0, latest), drag.initial_end)
            }
            DragMode::ResizeRight => {
                let earliest = (drag.initial_start + self.min_duration).min(duration);
                (drag.initial_start, (drag.initial_end + dt).clamp(earliest, duration))
            }
        }
    }

    fn creation_preview(&self, create: &CreateState, ctx: &InteractionContext<'_>) -> Preview {
        let start = create.anchor_time.min(create.current_time);
        let end = create
            .anchor_time
            .max(create.current_time)
            .max(start + self.min_duration)
            .min(ctx.duration);
        Preview {
            id: None,
            start,
            end,
            colliding: self.collisions.check_overlap(None, start, end, ctx.segments),
        }
    }

    // --- Double activation and synthesized loops ---

    fn register_activation(&mut self, pointer: &Pointer, time: f64, ctx: &InteractionContext<'_>, out: &mut Vec<Intent>) {
        let is_double = self.last_activation.is_some_and(|previous| {
            pointer.at_ms.saturating_sub(previous.at_ms) <= self.config.double_activation_ms
                && (pointer.x - previous.x).abs() <= self.config.tap_slop_px
        });
        if is_double {
            self.last_activation = None;
            self.synthesize_loop(time, ctx, out);
        } else {
            self.last_activation = Some(Activation {
                at_ms: pointer.at_ms,
                x: pointer.x,
            });
        }
    }

    /// Propose a default-length loop centered on `center`
    ///
    /// The loop is slid into the track; on collision the recommended position
    /// is used when it is free, otherwise the reason is reported.
    fn synthesize_loop(&self, center: f64, ctx: &InteractionContext<'_>, out: &mut Vec<Intent>) {
        if ctx.duration <= 0.0 {
            out.push(Intent::ValidationError(SegmentError::UnknownDuration.to_string()));
            return;
        }

        let length = self.default_length.min(ctx.duration);
        let (start, end) = fit_within_track(center - length / 2.0, length, ctx.duration);
        let validation = validate_with_min(start, end, ctx.duration, self.min_duration);
        if !validation.is_valid {
            out.push(Intent::ValidationError(validation.messages().join("; ")));
            return;
        }

        let info = self
            .collisions
            .collision_info(None, start, end, ctx.segments, ctx.duration);
        if !info.has_collision {
            out.push(Intent::CreateLoop { start, end });
            return;
        }

        let free = info.recommended_position.filter(|p| {
            validate_with_min(p.start, p.end, ctx.duration, self.min_duration).is_valid
                && !self.collisions.check_overlap(None, p.start, p.end, ctx.segments)
        });
        match free {
            Some(placement) => {
                log::debug!(
                    "InteractionController: loop at {:.3}s collides, placing at {:.3}s",
                    start,
                    placement.start
                );
                out.push(Intent::CreateLoop {
                    start: placement.start,
                    end: placement.end,
                });
            }
            None => out.push(Intent::ValidationError(SegmentError::Collision { info }.to_string())),
        }
    }

    // --- Keyboard ---

    fn key(&mut self, key: TimelineKey, ctx: &InteractionContext<'_>, out: &mut Vec<Intent>) {
        match key {
            TimelineKey::Escape => {
                if self.gesture != Gesture::Idle {
                    self.cancel(out);
                } else {
                    self.select(None, out);
                }
            }
            TimelineKey::Delete | TimelineKey::Backspace => {
                if self.gesture != Gesture::Idle {
                    return;
                }
                if let Some(id) = self.selected {
                    out.push(Intent::DeleteLoop(id));
                    self.select(None, out);
                }
            }
            TimelineKey::CreateLoop => {
                if self.gesture == Gesture::Idle && self.config.creation_enabled {
                    self.synthesize_loop(ctx.current_time, ctx, out);
                }
            }
        }
    }

    // --- Shared transitions ---

    /// Abandon the gesture in progress without committing anything
    fn cancel(&mut self, out: &mut Vec<Intent>) {
        if self.gesture == Gesture::Idle {
            return;
        }
        log::debug!("InteractionController: {:?} cancelled", self.phase());
        self.gesture = Gesture::Idle;
        self.clear_preview(out);
        out.push(Intent::ReleasePointer);
        out.push(Intent::PhaseChanged(Phase::Idle));
    }

    fn select(&mut self, id: Option<SegmentId>, out: &mut Vec<Intent>) {
        if self.selected == id {
            return;
        }
        self.selected = id;
        out.push(match id {
            Some(id) => Intent::Select(id),
            None => Intent::Deselect,
        });
    }

    fn set_hover(&mut self, hover: Option<Hit>, out: &mut Vec<Intent>) {
        if self.hover != hover {
            self.hover = hover;
            out.push(Intent::HoverChanged(hover));
        }
    }

    fn show_preview(&mut self, preview: Preview, out: &mut Vec<Intent>) {
        self.preview = Some(preview);
        out.push(Intent::Preview(preview));
    }

    fn clear_preview(&mut self, out: &mut Vec<Intent>) {
        if self.preview.take().is_some() {
            out.push(Intent::PreviewCleared);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopline_core::timeline::AdjacencyPolicy;
    use loopline_core::LoopSegment;

    const WIDTH: f64 = 200.0;
    const DURATION: f64 = 150.0;

    fn segments() -> Vec<LoopSegment> {
        vec![
            LoopSegment::new(SegmentId(1), "A", 10.0, 30.0),
            LoopSegment::new(SegmentId(2), "B", 50.0, 80.0),
        ]
    }

    fn ctx(segments: &[LoopSegment]) -> InteractionContext<'_> {
        InteractionContext {
            segments,
            duration: DURATION,
            current_time: 100.0,
        }
    }

    fn x(time: f64) -> f64 {
        time / DURATION * WIDTH
    }

    fn mouse(time: f64, at_ms: u64) -> Pointer {
        Pointer::mouse(x(time), WIDTH, at_ms)
    }

    fn creates(intents: &[Intent]) -> Vec<(f64, f64)> {
        intents
            .iter()
            .filter_map(|i| match i {
                Intent::CreateLoop { start, end } => Some((*start, *end)),
                _ => None,
            })
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn assert_created(intents: &[Intent], start: f64, end: f64) {
        match creates(intents).as_slice() {
            [(s, e)] => assert!(approx(*s, start) && approx(*e, end), "created [{}, {}]", s, e),
            other => panic!("expected one created loop, got {:?}", other),
        }
    }

    #[test]
    fn test_move_by_pixels() {
        let segs = vec![LoopSegment::new(SegmentId(1), "A", 10.0, 30.0)];
        let mut c = InteractionController::default();
        let down = Pointer::mouse(26.0, WIDTH, 0);
        let out = c.handle(TimelineInput::PointerDown(down), &ctx(&segs));
        assert_eq!(c.phase(), Phase::DraggingMove);
        assert!(out.contains(&Intent::Select(SegmentId(1))));
        assert!(out.contains(&Intent::CapturePointer));

        let up = Pointer::mouse(76.0, WIDTH, 200);
        c.handle(TimelineInput::PointerMove(up), &ctx(&segs));
        let out = c.handle(TimelineInput::PointerUp(up), &ctx(&segs));
        let moved = out.iter().find_map(|i| match i {
            Intent::MoveLoop { id, start, end } => Some((*id, *start, *end)),
            _ => None,
        });
        let (id, start, end) = moved.unwrap();
        assert_eq!(id, SegmentId(1));
        assert!(approx(start, 47.5) && approx(end, 67.5));
        assert!(out.contains(&Intent::ReleasePointer));
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_drag_keeps_last_valid_position() {
        let segs = segments();
        let mut c = InteractionController::default();
        c.handle(TimelineInput::PointerDown(Pointer::mouse(26.0, WIDTH, 0)), &ctx(&segs));
        // +7.5s is free
        c.handle(TimelineInput::PointerMove(Pointer::mouse(36.0, WIDTH, 50)), &ctx(&segs));
        // +22.5s would overlap B
        let out = c.handle(TimelineInput::PointerMove(Pointer::mouse(56.0, WIDTH, 100)), &ctx(&segs));
        assert!(out.is_empty());
        assert!(approx(c.preview().unwrap().start, 17.5));

        let out = c.handle(TimelineInput::PointerUp(Pointer::mouse(56.0, WIDTH, 150)), &ctx(&segs));
        assert!(out.iter().any(|i| matches!(i,
            Intent::MoveLoop { start, end, .. } if approx(*start, 17.5) && approx(*end, 37.5))));
    }

    #[test]
    fn test_resize_clamps_to_minimum_length() {
        let segs = segments();
        let mut c = InteractionController::default();
        // Right handle of A at 40 px, drag far left
        c.handle(TimelineInput::PointerDown(Pointer::mouse(39.0, WIDTH, 0)), &ctx(&segs));
        assert_eq!(c.phase(), Phase::DraggingResizeRight);
        let out = c.handle(TimelineInput::PointerUp(Pointer::mouse(-100.0, WIDTH, 100)), &ctx(&segs));
        assert!(out.iter().any(|i| matches!(i,
            Intent::ResizeLoop { edge: Edge::Right, start, end, .. }
                if approx(*start, 10.0) && approx(*end, 10.1))));
    }

    #[test]
    fn test_reverse_create_into_collision_is_discarded() {
        let segs = segments();
        let mut c = InteractionController::default();
        let down = mouse(55.0, 0).with_force_create(true);
        c.handle(TimelineInput::PointerDown(down), &ctx(&segs));
        assert_eq!(c.phase(), Phase::CreatingLoop);

        let out = c.handle(TimelineInput::PointerMove(mouse(40.0, 100)), &ctx(&segs));
        let preview = c.preview().unwrap();
        assert!(preview.colliding);
        assert!(approx(preview.start, 40.0) && approx(preview.end, 55.0));
        assert!(out.iter().any(|i| matches!(i, Intent::Preview(_))));

        let out = c.handle(TimelineInput::PointerUp(mouse(40.0, 150)), &ctx(&segs));
        assert!(creates(&out).is_empty());
        assert!(out.contains(&Intent::PreviewCleared));
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_create_on_empty_track() {
        let segs = segments();
        let mut c = InteractionController::default();
        c.handle(TimelineInput::PointerDown(mouse(90.0, 0)), &ctx(&segs));
        c.handle(TimelineInput::PointerMove(mouse(100.0, 50)), &ctx(&segs));
        let out = c.handle(TimelineInput::PointerUp(mouse(110.0, 100)), &ctx(&segs));
        assert_created(&out, 90.0, 110.0);
    }

    #[test]
    fn test_click_without_drag_seeks() {
        let segs = segments();
        let mut c = InteractionController::default();
        c.handle(TimelineInput::PointerDown(mouse(120.0, 0)), &ctx(&segs));
        let out = c.handle(TimelineInput::PointerUp(mouse(120.0, 80)), &ctx(&segs));
        assert!(creates(&out).is_empty());
        assert!(out.iter().any(|i| matches!(i, Intent::Seek(t) if approx(*t, 120.0))));
    }

    #[test]
    fn test_seek_mode_when_creation_disabled() {
        let segs = segments();
        let mut c = InteractionController::default();
        c.set_creation_enabled(false);
        let out = c.handle(TimelineInput::PointerDown(mouse(120.0, 0)), &ctx(&segs));
        assert_eq!(c.phase(), Phase::Seeking);
        assert!(out.iter().any(|i| matches!(i, Intent::Seek(t) if approx(*t, 120.0))));

        let out = c.handle(TimelineInput::PointerMove(mouse(130.0, 50)), &ctx(&segs));
        assert!(out.iter().any(|i| matches!(i, Intent::Seek(t) if approx(*t, 130.0))));
        c.handle(TimelineInput::PointerUp(mouse(130.0, 100)), &ctx(&segs));
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_double_click_synthesizes_loop() {
        let segs = segments();
        let mut c = InteractionController::default();
        for (down, up) in [(0, 50), (150, 200)] {
            let out1 = c.handle(TimelineInput::PointerDown(mouse(120.0, down)), &ctx(&segs));
            let out2 = c.handle(TimelineInput::PointerUp(mouse(120.0, up)), &ctx(&segs));
            if down == 0 {
                assert!(creates(&out1).is_empty() && creates(&out2).is_empty());
            } else {
                assert_created(&out2, 117.5, 122.5);
            }
        }
    }

    #[test]
    fn test_slow_second_click_is_not_double() {
        let segs = segments();
        let mut c = InteractionController::default();
        c.handle(TimelineInput::PointerDown(mouse(120.0, 0)), &ctx(&segs));
        c.handle(TimelineInput::PointerUp(mouse(120.0, 50)), &ctx(&segs));
        c.handle(TimelineInput::PointerDown(mouse(120.0, 600)), &ctx(&segs));
        let out = c.handle(TimelineInput::PointerUp(mouse(120.0, 650)), &ctx(&segs));
        assert!(creates(&out).is_empty());
    }

    #[test]
    fn test_keyboard_create_slides_into_track() {
        let segs = segments();
        let mut c = InteractionController::default();
        let ctx = InteractionContext {
            segments: &segs,
            duration: DURATION,
            current_time: 149.0,
        };
        let out = c.handle(TimelineInput::Key(TimelineKey::CreateLoop), &ctx);
        assert_created(&out, 145.0, 150.0);

        c.set_creation_enabled(false);
        assert!(c.handle(TimelineInput::Key(TimelineKey::CreateLoop), &ctx).is_empty());
    }

    #[test]
    fn test_keyboard_create_uses_recommended_position() {
        let segs = segments();
        let mut c = InteractionController::default();
        let ctx = InteractionContext {
            segments: &segs,
            duration: DURATION,
            current_time: 78.0,
        };
        let out = c.handle(TimelineInput::Key(TimelineKey::CreateLoop), &ctx);
        assert_created(&out, 80.0, 85.0);
    }

    #[test]
    fn test_keyboard_create_without_room_reports_error() {
        let segs = vec![
            LoopSegment::new(SegmentId(1), "A", 0.0, 10.0),
            LoopSegment::new(SegmentId(2), "B", 12.0, 20.0),
        ];
        let mut c = InteractionController::default();
        let ctx = InteractionContext {
            segments: &segs,
            duration: 20.0,
            current_time: 11.0,
        };
        let out = c.handle(TimelineInput::Key(TimelineKey::CreateLoop), &ctx);
        assert!(creates(&out).is_empty());
        assert!(matches!(out.as_slice(), [Intent::ValidationError(_)]));
    }

    #[test]
    fn test_touch_tap_on_segment_selects_only() {
        let segs = segments();
        let mut c = InteractionController::default();
        let out = c.handle(TimelineInput::PointerDown(Pointer::touch(26.0, WIDTH, 0)), &ctx(&segs));
        assert!(out.contains(&Intent::Select(SegmentId(1))));
        let out = c.handle(TimelineInput::PointerUp(Pointer::touch(30.0, WIDTH, 120)), &ctx(&segs));
        assert!(!out.iter().any(|i| matches!(i, Intent::MoveLoop { .. })));
        assert_eq!(c.selected(), Some(SegmentId(1)));
    }

    #[test]
    fn test_touch_tap_on_empty_track_seeks() {
        let segs = segments();
        let mut c = InteractionController::default();
        c.handle(TimelineInput::PointerDown(Pointer::touch(x(120.0), WIDTH, 0)), &ctx(&segs));
        let out = c.handle(TimelineInput::PointerUp(Pointer::touch(x(120.0) + 4.0, WIDTH, 100)), &ctx(&segs));
        assert!(creates(&out).is_empty());
        assert!(out.iter().any(|i| matches!(i, Intent::Seek(t) if approx(*t, 120.0))));
    }

    #[test]
    fn test_synthetic_mouse_after_touch_ignored() {
        let segs = segments();
        let mut c = InteractionController::default();
        c.handle(TimelineInput::PointerDown(Pointer::touch(x(120.0), WIDTH, 0)), &ctx(&segs));
        c.handle(TimelineInput::PointerUp(Pointer::touch(x(120.0), WIDTH, 100)), &ctx(&segs));

        let out = c.handle(TimelineInput::PointerDown(mouse(120.0, 400)), &ctx(&segs));
        assert!(out.is_empty());
        assert_eq!(c.phase(), Phase::Idle);

        let out = c.handle(TimelineInput::PointerDown(mouse(120.0, 700)), &ctx(&segs));
        assert!(!out.is_empty());
    }

    #[test]
    fn test_escape_cancels_without_commit() {
        let segs = segments();
        let mut c = InteractionController::default();
        c.handle(TimelineInput::PointerDown(Pointer::mouse(26.0, WIDTH, 0)), &ctx(&segs));
        c.handle(TimelineInput::PointerMove(Pointer::mouse(36.0, WIDTH, 50)), &ctx(&segs));
        let out = c.handle(TimelineInput::Key(TimelineKey::Escape), &ctx(&segs));
        assert_eq!(
            out,
            vec![
                Intent::PreviewCleared,
                Intent::ReleasePointer,
                Intent::PhaseChanged(Phase::Idle)
            ]
        );
        let out = c.handle(TimelineInput::PointerUp(Pointer::mouse(36.0, WIDTH, 100)), &ctx(&segs));
        assert!(out.is_empty());
    }

    #[test]
    fn test_blur_cancels_creation() {
        let segs = segments();
        let mut c = InteractionController::default();
        c.handle(TimelineInput::PointerDown(mouse(90.0, 0)), &ctx(&segs));
        c.handle(TimelineInput::PointerMove(mouse(110.0, 50)), &ctx(&segs));
        let out = c.handle(TimelineInput::Blur, &ctx(&segs));
        assert!(creates(&out).is_empty());
        assert!(out.contains(&Intent::ReleasePointer));
        assert_eq!(c.preview(), None);
    }

    #[test]
    fn test_delete_selected() {
        let segs = segments();
        let mut c = InteractionController::default();
        assert!(c.handle(TimelineInput::Key(TimelineKey::Delete), &ctx(&segs)).is_empty());

        c.handle(TimelineInput::PointerDown(Pointer::mouse(26.0, WIDTH, 0)), &ctx(&segs));
        c.handle(TimelineInput::PointerUp(Pointer::mouse(26.0, WIDTH, 50)), &ctx(&segs));
        let out = c.handle(TimelineInput::Key(TimelineKey::Backspace), &ctx(&segs));
        assert_eq!(out, vec![Intent::DeleteLoop(SegmentId(1)), Intent::Deselect]);
        assert_eq!(c.selected(), None);
    }

    fn moved(intents: &[Intent]) -> Option<(f64, f64)> {
        intents.iter().find_map(|i| match i {
            Intent::MoveLoop { start, end, .. } => Some((*start, *end)),
            _ => None,
        })
    }

    #[test]
    fn test_touch_drag_past_slop_moves() {
        let segs = vec![LoopSegment::new(SegmentId(1), "A", 10.0, 30.0)];
        let mut c = InteractionController::default();
        c.handle(TimelineInput::PointerDown(Pointer::touch(26.0, WIDTH, 0)), &ctx(&segs));
        assert_eq!(c.phase(), Phase::DraggingMove);
        c.handle(TimelineInput::PointerMove(Pointer::touch(50.0, WIDTH, 60)), &ctx(&segs));
        let out = c.handle(TimelineInput::PointerUp(Pointer::touch(76.0, WIDTH, 120)), &ctx(&segs));
        let (start, end) = moved(&out).unwrap();
        assert!(approx(start, 47.5) && approx(end, 67.5));
    }

    #[test]
    fn test_long_touch_within_slop_moves() {
        let segs = segments();
        let mut c = InteractionController::default();
        c.handle(TimelineInput::PointerDown(Pointer::touch(26.0, WIDTH, 0)), &ctx(&segs));
        // 8 px stays inside the tap slop, but 400 ms is no tap
        let out = c.handle(TimelineInput::PointerUp(Pointer::touch(34.0, WIDTH, 400)), &ctx(&segs));
        let (start, end) = moved(&out).unwrap();
        assert!(approx(start, 16.0) && approx(end, 36.0));
    }

    #[test]
    fn test_double_tap_synthesizes_loop() {
        let segs = segments();
        let mut c = InteractionController::default();
        c.handle(TimelineInput::PointerDown(Pointer::touch(x(120.0), WIDTH, 0)), &ctx(&segs));
        let out = c.handle(TimelineInput::PointerUp(Pointer::touch(x(120.0), WIDTH, 80)), &ctx(&segs));
        assert!(creates(&out).is_empty());

        c.handle(TimelineInput::PointerDown(Pointer::touch(x(120.0) + 2.0, WIDTH, 200)), &ctx(&segs));
        let out = c.handle(TimelineInput::PointerUp(Pointer::touch(x(120.0) + 2.0, WIDTH, 260)), &ctx(&segs));
        assert_created(&out, 119.0, 124.0);
    }

    #[test]
    fn test_resize_left_clamps_to_track_and_minimum_length() {
        let segs = segments();
        let mut c = InteractionController::default();
        // Left handle of A at 13.3 px
        c.handle(TimelineInput::PointerDown(Pointer::mouse(15.0, WIDTH, 0)), &ctx(&segs));
        assert_eq!(c.phase(), Phase::DraggingResizeLeft);
        let out = c.handle(TimelineInput::PointerUp(Pointer::mouse(-100.0, WIDTH, 100)), &ctx(&segs));
        assert!(out.iter().any(|i| matches!(i,
            Intent::ResizeLoop { edge: Edge::Left, start, end, .. }
                if approx(*start, 0.0) && approx(*end, 30.0))));

        c.handle(TimelineInput::PointerDown(Pointer::mouse(15.0, WIDTH, 1000)), &ctx(&segs));
        let out = c.handle(TimelineInput::PointerUp(Pointer::mouse(300.0, WIDTH, 1100)), &ctx(&segs));
        assert!(out.iter().any(|i| matches!(i,
            Intent::ResizeLoop { edge: Edge::Left, start, end, .. }
                if approx(*start, 29.9) && approx(*end, 30.0))));
    }

    /// 256 px over 128 s keeps pixel math exact, so touching edges stay exact
    fn exact_ctx(segments: &[LoopSegment]) -> InteractionContext<'_> {
        InteractionContext {
            segments,
            duration: 128.0,
            current_time: 0.0,
        }
    }

    fn controller(adjacency: AdjacencyPolicy) -> InteractionController {
        let timeline = TimelineConfig {
            adjacency,
            ..TimelineConfig::default()
        };
        InteractionController::new(&InteractionConfig::default(), &timeline)
    }

    #[test]
    fn test_drag_to_touching_edge_under_forbid() {
        let segs = segments();
        for (adjacency, expected) in [
            (AdjacencyPolicy::Allow, (30.0, 50.0)),
            (AdjacencyPolicy::Forbid, (20.0, 40.0)),
        ] {
            let mut c = controller(adjacency);
            // A spans 20..60 px; +20 px is +10 s, +40 px would touch B
            c.handle(TimelineInput::PointerDown(Pointer::mouse(40.0, 256.0, 0)), &exact_ctx(&segs));
            c.handle(TimelineInput::PointerMove(Pointer::mouse(60.0, 256.0, 50)), &exact_ctx(&segs));
            let out = c.handle(TimelineInput::PointerUp(Pointer::mouse(80.0, 256.0, 100)), &exact_ctx(&segs));
            assert_eq!(moved(&out), Some(expected), "{:?}", adjacency);
        }
    }

    #[test]
    fn test_create_touching_segment_under_forbid() {
        let segs = segments();
        for (adjacency, allowed) in [(AdjacencyPolicy::Allow, true), (AdjacencyPolicy::Forbid, false)] {
            let mut c = controller(adjacency);
            // Drag from 35 s back to A's end at 30 s
            c.handle(TimelineInput::PointerDown(Pointer::mouse(70.0, 256.0, 0)), &exact_ctx(&segs));
            c.handle(TimelineInput::PointerMove(Pointer::mouse(60.0, 256.0, 50)), &exact_ctx(&segs));
            assert_eq!(c.preview().map(|p| p.colliding), Some(!allowed));
            let out = c.handle(TimelineInput::PointerUp(Pointer::mouse(60.0, 256.0, 100)), &exact_ctx(&segs));
            if allowed {
                assert_created(&out, 30.0, 35.0);
            } else {
                assert!(creates(&out).is_empty());
            }
        }
    }

    #[test]
    fn test_press_during_gesture_ignored() {
        let segs = segments();
        let mut c = InteractionController::default();
        c.handle(TimelineInput::PointerDown(Pointer::mouse(26.0, WIDTH, 0)), &ctx(&segs));
        let out = c.handle(TimelineInput::PointerDown(mouse(120.0, 10)), &ctx(&segs));
        assert!(out.is_empty());
        assert_eq!(c.phase(), Phase::DraggingMove);
    }

    #[test]
    fn test_hover_changes_reported_once() {
        let segs = segments();
        let mut c = InteractionController::default();
        let out = c.handle(TimelineInput::PointerMove(Pointer::mouse(26.0, WIDTH, 0)), &ctx(&segs));
        assert_eq!(out, vec![Intent::HoverChanged(Some(Hit::Body(SegmentId(1))))]);
        assert!(c.handle(TimelineInput::PointerMove(Pointer::mouse(27.0, WIDTH, 10)), &ctx(&segs)).is_empty());
        let out = c.handle(TimelineInput::PointerLeft, &ctx(&segs));
        assert_eq!(out, vec![Intent::HoverChanged(None)]);
    }
}
