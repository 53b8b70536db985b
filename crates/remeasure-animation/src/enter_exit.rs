//! Enter and exit transitions for content that appears or disappears.

use crate::animation::AnimationType;
use crate::transition::{default_spring, Segment, Transition, TransitionValue};
use remeasure_geometry::{Point, Size};
use remeasure_layout::{Alignment, LayoutDirection};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Add;
use std::rc::Rc;

/// Lifecycle of a piece of content inside an enter/exit animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnterExitState {
    /// Before entering; the enter transition's start values.
    PreEnter,
    Visible,
    /// After exiting; the exit transition's end values.
    PostExit,
}

type SizeFn<T> = Rc<dyn Fn(Size) -> T>;

#[derive(Clone, Debug, PartialEq)]
pub struct Fade {
    /// Alpha outside the visible state.
    pub alpha: f32,
    pub spec: AnimationType,
}

#[derive(Clone)]
pub struct Slide {
    /// Offset outside the visible state, from the content's full size.
    pub offset: SizeFn<Point>,
    pub spec: AnimationType,
}

#[derive(Clone)]
pub struct ChangeSize {
    /// Which part of the content stays put while the size changes.
    pub alignment: Alignment,
    /// Size outside the visible state, from the content's full size.
    pub size: SizeFn<Size>,
    pub clip: bool,
    pub spec: AnimationType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scale {
    pub scale: f32,
    /// Pivot as a fraction of the content size.
    pub origin: Point,
    pub spec: AnimationType,
}

/// Per-property description shared by enter and exit transitions.
#[derive(Clone, Default)]
pub struct TransitionData {
    pub fade: Option<Fade>,
    pub slide: Option<Slide>,
    pub change_size: Option<ChangeSize>,
    pub scale: Option<Scale>,
    pub hold: bool,
}

impl TransitionData {
    /// Combines two descriptions; `self` wins where both set a property.
    fn merge(self, other: TransitionData) -> TransitionData {
        TransitionData {
            fade: self.fade.or(other.fade),
            slide: self.slide.or(other.slide),
            change_size: self.change_size.or(other.change_size),
            scale: self.scale.or(other.scale),
            hold: self.hold || other.hold,
        }
    }

    fn is_empty(&self) -> bool {
        self.fade.is_none()
            && self.slide.is_none()
            && self.change_size.is_none()
            && self.scale.is_none()
    }
}

impl fmt::Debug for TransitionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionData")
            .field("fade", &self.fade)
            .field("slide", &self.slide.is_some())
            .field("change_size", &self.change_size.as_ref().map(|c| c.alignment))
            .field("scale", &self.scale)
            .field("hold", &self.hold)
            .finish()
    }
}

/// How content appears. Combine with `+`.
#[derive(Clone, Debug, Default)]
pub struct EnterTransition {
    pub data: TransitionData,
}

/// How content disappears. Combine with `+`.
#[derive(Clone, Debug, Default)]
pub struct ExitTransition {
    pub data: TransitionData,
}

impl EnterTransition {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.data.is_empty()
    }

    pub fn fade_in(spec: AnimationType, initial_alpha: f32) -> Self {
        Self::with(TransitionData {
            fade: Some(Fade {
                alpha: initial_alpha,
                spec,
            }),
            ..TransitionData::default()
        })
    }

    pub fn slide_in(spec: AnimationType, initial_offset: impl Fn(Size) -> Point + 'static) -> Self {
        Self::with(TransitionData {
            slide: Some(Slide {
                offset: Rc::new(initial_offset),
                spec,
            }),
            ..TransitionData::default()
        })
    }

    /// Slides in from beyond the leading edge.
    pub fn slide_in_horizontally(spec: AnimationType) -> Self {
        Self::slide_in(spec, |full| Point::new(-full.width, 0.0))
    }

    pub fn expand_in(
        spec: AnimationType,
        expand_from: Alignment,
        initial_size: impl Fn(Size) -> Size + 'static,
        clip: bool,
    ) -> Self {
        Self::with(TransitionData {
            change_size: Some(ChangeSize {
                alignment: expand_from,
                size: Rc::new(initial_size),
                clip,
                spec,
            }),
            ..TransitionData::default()
        })
    }

    pub fn scale_in(spec: AnimationType, initial_scale: f32) -> Self {
        Self::with(TransitionData {
            scale: Some(Scale {
                scale: initial_scale,
                origin: Point::new(0.5, 0.5),
                spec,
            }),
            ..TransitionData::default()
        })
    }

    fn with(data: TransitionData) -> Self {
        Self { data }
    }
}

impl ExitTransition {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.data.is_empty() && !self.data.hold
    }

    /// Keeps the exiting content until the entering content has finished
    /// entering, without animating it.
    pub fn hold() -> Self {
        Self::with(TransitionData {
            hold: true,
            ..TransitionData::default()
        })
    }

    pub fn fade_out(spec: AnimationType, target_alpha: f32) -> Self {
        Self::with(TransitionData {
            fade: Some(Fade {
                alpha: target_alpha,
                spec,
            }),
            ..TransitionData::default()
        })
    }

    pub fn slide_out(spec: AnimationType, target_offset: impl Fn(Size) -> Point + 'static) -> Self {
        Self::with(TransitionData {
            slide: Some(Slide {
                offset: Rc::new(target_offset),
                spec,
            }),
            ..TransitionData::default()
        })
    }

    /// Slides out beyond the trailing edge.
    pub fn slide_out_horizontally(spec: AnimationType) -> Self {
        Self::slide_out(spec, |full| Point::new(full.width, 0.0))
    }

    pub fn shrink_out(
        spec: AnimationType,
        shrink_towards: Alignment,
        target_size: impl Fn(Size) -> Size + 'static,
        clip: bool,
    ) -> Self {
        Self::with(TransitionData {
            change_size: Some(ChangeSize {
                alignment: shrink_towards,
                size: Rc::new(target_size),
                clip,
                spec,
            }),
            ..TransitionData::default()
        })
    }

    pub fn scale_out(spec: AnimationType, target_scale: f32) -> Self {
        Self::with(TransitionData {
            scale: Some(Scale {
                scale: target_scale,
                origin: Point::new(0.5, 0.5),
                spec,
            }),
            ..TransitionData::default()
        })
    }

    fn with(data: TransitionData) -> Self {
        Self { data }
    }
}

impl Add for EnterTransition {
    type Output = EnterTransition;

    fn add(self, other: EnterTransition) -> EnterTransition {
        EnterTransition::with(self.data.merge(other.data))
    }
}

impl Add for ExitTransition {
    type Output = ExitTransition;

    fn add(self, other: ExitTransition) -> ExitTransition {
        ExitTransition::with(self.data.merge(other.data))
    }
}

/// Everything an enter/exit animation contributes to one frame.
///
/// Effects apply in a fixed order: the slide translates the content, the
/// size change then clips it to `size` (anchored by `offset`), and the fade
/// and scale apply last in the graphics layer so a fading edge is never
/// clipped twice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComposedEffect {
    pub slide: Point,
    /// Bounds the content occupies after the size change.
    pub size: Size,
    /// Offset of the content inside those bounds.
    pub offset: Point,
    pub clip: bool,
    pub alpha: f32,
    pub scale: f32,
    pub scale_origin: Point,
}

impl ComposedEffect {
    /// Where the content's origin lands relative to its layout slot.
    pub fn content_position(&self) -> Point {
        self.offset + self.slide
    }
}

struct Specs {
    enter: RefCell<EnterTransition>,
    exit: RefCell<ExitTransition>,
    full_size: Cell<Option<Size>>,
    /// Alignment the clip is anchored to for the current run.
    current_alignment: Cell<Option<Alignment>>,
    direction: Cell<LayoutDirection>,
}

impl Specs {
    fn full_size(&self) -> Size {
        self.full_size.get().unwrap_or(Size::ZERO)
    }

    fn entering(segment: &Segment<EnterExitState>) -> bool {
        segment.is_transitioning_to(&EnterExitState::PreEnter, &EnterExitState::Visible)
    }

    fn alignment(&self, segment: &Segment<EnterExitState>) -> Option<Alignment> {
        let enter = self.enter.borrow().data.change_size.as_ref().map(|c| c.alignment);
        let exit = self.exit.borrow().data.change_size.as_ref().map(|c| c.alignment);
        if Self::entering(segment) {
            enter.or(exit)
        } else {
            exit.or(enter)
        }
    }

    /// Clip anchor of content resting in `state`.
    fn resting_alignment(&self, state: &EnterExitState) -> Option<Alignment> {
        let enter = self.enter.borrow().data.change_size.as_ref().map(|c| c.alignment);
        let exit = self.exit.borrow().data.change_size.as_ref().map(|c| c.alignment);
        match state {
            EnterExitState::PreEnter => enter.or(exit),
            EnterExitState::Visible => None,
            EnterExitState::PostExit => exit.or(enter),
        }
    }

    fn spec(
        &self,
        segment: &Segment<EnterExitState>,
        pick: impl Fn(&TransitionData) -> Option<AnimationType>,
    ) -> AnimationType {
        let chosen = if Self::entering(segment) {
            pick(&self.enter.borrow().data)
        } else if segment.is_transitioning_to(&EnterExitState::Visible, &EnterExitState::PostExit) {
            pick(&self.exit.borrow().data)
        } else {
            None
        };
        chosen.unwrap_or_else(default_spring)
    }

    fn alpha(&self, state: &EnterExitState) -> f32 {
        let fade = |data: &TransitionData| data.fade.as_ref().map(|fade| fade.alpha);
        match state {
            EnterExitState::PreEnter => fade(&self.enter.borrow().data),
            EnterExitState::Visible => None,
            EnterExitState::PostExit => fade(&self.exit.borrow().data),
        }
        .unwrap_or(1.0)
    }

    fn scale(&self, state: &EnterExitState) -> f32 {
        let scale = |data: &TransitionData| data.scale.as_ref().map(|scale| scale.scale);
        match state {
            EnterExitState::PreEnter => scale(&self.enter.borrow().data),
            EnterExitState::Visible => None,
            EnterExitState::PostExit => scale(&self.exit.borrow().data),
        }
        .unwrap_or(1.0)
    }

    fn slide(&self, state: &EnterExitState) -> Point {
        let full = self.full_size();
        let slide = |data: &TransitionData| data.slide.as_ref().map(|slide| (slide.offset)(full));
        match state {
            EnterExitState::PreEnter => slide(&self.enter.borrow().data),
            EnterExitState::Visible => None,
            EnterExitState::PostExit => slide(&self.exit.borrow().data),
        }
        .unwrap_or(Point::ZERO)
    }

    fn size(&self, state: &EnterExitState) -> Size {
        let full = self.full_size();
        let size = |data: &TransitionData| data.change_size.as_ref().map(|c| (c.size)(full));
        match state {
            EnterExitState::PreEnter => size(&self.enter.borrow().data),
            EnterExitState::Visible => None,
            EnterExitState::PostExit => size(&self.exit.borrow().data),
        }
        .unwrap_or(full)
    }

    /// Offset that moves the clip from the latched alignment to the exit
    /// alignment by the time the content has shrunk. Added to the latched
    /// clip offset it lands where a plain exit ends.
    fn alignment_correction(&self, state: &EnterExitState) -> Point {
        if *state != EnterExitState::PostExit {
            return Point::ZERO;
        }
        let Some(current) = self.current_alignment.get() else {
            return Point::ZERO;
        };
        let exit = self.exit.borrow();
        let Some(shrink) = exit.data.change_size.as_ref() else {
            return Point::ZERO;
        };
        if shrink.alignment == current {
            return Point::ZERO;
        }
        let full = self.full_size();
        let end = (shrink.size)(full);
        let direction = self.direction.get();
        let target = shrink.alignment.align_offset(end, full, direction);
        let latched = current.align_offset(end, full, direction);
        latched - target
    }
}

/// Drives one piece of content through [`EnterExitState`]s.
///
/// Only properties that the enter or the exit transition specify get an
/// animation; the rest stay at their resting value.
pub struct EnterExitAnimation {
    transition: Transition<EnterExitState>,
    specs: Rc<Specs>,
    alpha: RefCell<Option<TransitionValue<f32>>>,
    scale: RefCell<Option<TransitionValue<f32>>>,
    slide: RefCell<Option<TransitionValue<Point>>>,
    size: RefCell<Option<TransitionValue<Size>>>,
    correction: RefCell<Option<TransitionValue<Point>>>,
}

impl EnterExitAnimation {
    pub fn new(
        transition: Transition<EnterExitState>,
        enter: EnterTransition,
        exit: ExitTransition,
    ) -> Self {
        let animation = Self {
            transition,
            specs: Rc::new(Specs {
                enter: RefCell::new(enter),
                exit: RefCell::new(exit),
                full_size: Cell::new(None),
                current_alignment: Cell::new(None),
                direction: Cell::new(LayoutDirection::Ltr),
            }),
            alpha: RefCell::new(None),
            scale: RefCell::new(None),
            slide: RefCell::new(None),
            size: RefCell::new(None),
            correction: RefCell::new(None),
        };
        animation.ensure_values();
        animation
    }

    pub fn transition(&self) -> &Transition<EnterExitState> {
        &self.transition
    }

    pub fn enter(&self) -> EnterTransition {
        self.specs.enter.borrow().clone()
    }

    pub fn exit(&self) -> ExitTransition {
        self.specs.exit.borrow().clone()
    }

    pub fn set_enter(&self, enter: EnterTransition) {
        self.settle();
        *self.specs.enter.borrow_mut() = enter;
        self.ensure_values();
        self.transition.refresh_targets();
    }

    pub fn set_exit(&self, exit: ExitTransition) {
        self.settle();
        *self.specs.exit.borrow_mut() = exit;
        self.ensure_values();
        self.transition.refresh_targets();
    }

    pub fn holds_on_exit(&self) -> bool {
        self.specs.exit.borrow().data.hold
    }

    /// True once the content has fully entered.
    pub fn is_entered(&self) -> bool {
        self.transition.current_state() == EnterExitState::Visible && !self.transition.is_running()
    }

    /// True once the content has fully exited.
    pub fn is_exited(&self) -> bool {
        self.transition.current_state() == EnterExitState::PostExit && !self.transition.is_running()
    }

    pub fn full_size(&self) -> Option<Size> {
        self.specs.full_size.get()
    }

    /// Records the content's measured size, re-deriving size and slide
    /// targets when it changed.
    pub fn set_full_size(&self, size: Size) {
        if self.specs.full_size.get() == Some(size) {
            return;
        }
        self.specs.full_size.set(Some(size));
        self.transition.refresh_targets();
    }

    /// Direction START and END change-size anchors resolve against.
    pub fn set_layout_direction(&self, direction: LayoutDirection) {
        if self.specs.direction.replace(direction) != direction {
            self.transition.refresh_targets();
        }
    }

    /// Effect for the current frame.
    pub fn effect(&self) -> ComposedEffect {
        let full = self.specs.full_size();
        let anchor = self.clip_alignment();
        let size = read(&self.size).unwrap_or(full);
        let clip = anchor
            .map(|alignment| -alignment.align_offset(size, full, self.specs.direction.get()))
            .unwrap_or(Point::ZERO);
        let correction = read(&self.correction).unwrap_or(Point::ZERO);
        let (clip_enabled, scale_origin) = {
            let enter = self.specs.enter.borrow();
            let exit = self.specs.exit.borrow();
            let clip_enabled = [&enter.data, &exit.data]
                .iter()
                .filter_map(|data| data.change_size.as_ref())
                .any(|c| c.clip);
            let origin = enter
                .data
                .scale
                .as_ref()
                .or(exit.data.scale.as_ref())
                .map(|s| s.origin)
                .unwrap_or(Point::new(0.5, 0.5));
            (clip_enabled, origin)
        };
        ComposedEffect {
            slide: read(&self.slide).unwrap_or(Point::ZERO),
            size,
            offset: clip + correction,
            clip: clip_enabled && size != full,
            alpha: read(&self.alpha).unwrap_or(1.0),
            scale: read(&self.scale).unwrap_or(1.0),
            scale_origin,
        }
    }

    /// The clip anchor is fixed for the duration of a run so switching from
    /// an enter alignment to a different exit alignment does not jump; the
    /// correction value covers the difference instead. At rest the anchor
    /// is the resting state's own alignment.
    fn clip_alignment(&self) -> Option<Alignment> {
        if !self.transition.is_running() {
            self.settle();
            return self
                .specs
                .resting_alignment(&self.transition.current_state());
        }
        if self.specs.current_alignment.get().is_none() {
            let alignment = self
                .specs
                .alignment(&self.transition.segment())
                .unwrap_or(Alignment::TOP_START);
            self.specs.current_alignment.set(Some(alignment));
        }
        self.specs.current_alignment.get()
    }

    /// Drops the anchor of a finished run. The correction snaps back to
    /// zero so the next run starts from the resting offset.
    pub(crate) fn settle(&self) {
        if self.transition.is_running() || self.specs.current_alignment.get().is_none() {
            return;
        }
        self.specs.current_alignment.set(None);
        self.transition.refresh_targets();
    }

    fn ensure_values(&self) {
        let (fade, scale, slide, change_size) = {
            let enter = self.specs.enter.borrow();
            let exit = self.specs.exit.borrow();
            let (enter, exit) = (&enter.data, &exit.data);
            (
                enter.fade.is_some() || exit.fade.is_some(),
                enter.scale.is_some() || exit.scale.is_some(),
                enter.slide.is_some() || exit.slide.is_some(),
                enter.change_size.is_some() || exit.change_size.is_some(),
            )
        };
        if fade && self.alpha.borrow().is_none() {
            let (specs, targets) = (self.specs.clone(), self.specs.clone());
            let value = self.transition.animate_float(
                "alpha",
                move |segment| specs.spec(segment, |d| d.fade.as_ref().map(|f| f.spec)),
                move |state| targets.alpha(state),
            );
            *self.alpha.borrow_mut() = Some(value);
        }
        if scale && self.scale.borrow().is_none() {
            let (specs, targets) = (self.specs.clone(), self.specs.clone());
            let value = self.transition.animate_float(
                "scale",
                move |segment| specs.spec(segment, |d| d.scale.as_ref().map(|s| s.spec)),
                move |state| targets.scale(state),
            );
            *self.scale.borrow_mut() = Some(value);
        }
        if slide && self.slide.borrow().is_none() {
            let (specs, targets) = (self.specs.clone(), self.specs.clone());
            let value = self.transition.animate_offset(
                "slide",
                move |segment| specs.spec(segment, |d| d.slide.as_ref().map(|s| s.spec)),
                move |state| targets.slide(state),
            );
            *self.slide.borrow_mut() = Some(value);
        }
        if change_size && self.size.borrow().is_none() {
            let (specs, targets) = (self.specs.clone(), self.specs.clone());
            let value = self.transition.animate_size(
                "size",
                move |segment| specs.spec(segment, |d| d.change_size.as_ref().map(|c| c.spec)),
                move |state| targets.size(state),
            );
            *self.size.borrow_mut() = Some(value);

            let (specs, targets) = (self.specs.clone(), self.specs.clone());
            let value = self.transition.animate_offset(
                "alignment correction",
                move |segment| specs.spec(segment, |d| d.change_size.as_ref().map(|c| c.spec)),
                move |state| targets.alignment_correction(state),
            );
            *self.correction.borrow_mut() = Some(value);
        }
    }
}

fn read<T>(slot: &RefCell<Option<TransitionValue<T>>>) -> Option<T> {
    slot.borrow().as_ref().map(TransitionValue::value)
}

#[cfg(test)]
#[path = "tests/enter_exit_tests.rs"]
mod tests;
