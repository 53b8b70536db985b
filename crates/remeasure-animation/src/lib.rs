//! Animation for remeasure
//!
//! Single-value animations ([`Animatable`]), state-driven [`Transition`]s,
//! enter/exit effects and the [`ContentTransitionCoordinator`] that swaps
//! one subtree for another inside a lookahead scope.

mod animation;
mod content_transition;
mod enter_exit;
mod transition;

pub use animation::{
    Animatable, Animated, AnimationSpec, AnimationType, Easing, Lerp, SpringSpec,
    TargetBasedAnimation,
};
pub use content_transition::{
    AnimatedContentPolicy, ContentEvent, ContentKey, ContentTransform,
    ContentTransitionCoordinator, SizeTransform,
};
pub use enter_exit::{
    ChangeSize, ComposedEffect, EnterExitAnimation, EnterExitState, EnterTransition,
    ExitTransition, Fade, Scale, Slide, TransitionData,
};
pub use transition::{default_spring, Segment, Transition, TransitionState, TransitionValue};

pub mod prelude {
    pub use crate::{
        AnimatedContentPolicy, AnimationSpec, AnimationType, ContentEvent, ContentTransform,
        ContentTransitionCoordinator, EnterTransition, ExitTransition, Segment, SizeTransform,
        SpringSpec, Transition,
    };
}
