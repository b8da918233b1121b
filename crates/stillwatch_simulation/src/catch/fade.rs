//! Screen fade (0 = прозрачно, 1 = чёрный экран). Рисует хост.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Resource)]
pub struct ScreenFade {
    pub alpha: f32,
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

impl ScreenFade {
    pub fn fade_out(&mut self, duration: f32) {
        self.start(1.0, duration);
    }

    pub fn fade_in(&mut self, duration: f32) {
        self.start(0.0, duration);
    }

    fn start(&mut self, to: f32, duration: f32) {
        self.from = self.alpha;
        self.to = to;
        self.elapsed = 0.0;
        self.duration = duration.max(0.0);
        if self.duration == 0.0 {
            self.alpha = to;
        }
    }

    pub fn is_animating(&self) -> bool {
        self.alpha != self.to
    }

    pub fn tick(&mut self, delta: f32) {
        if !self.is_animating() {
            return;
        }
        self.elapsed += delta;
        let t = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.alpha = self.from + (self.to - self.from) * t;
    }
}

/// Система: анимация fade (фаза Sequence, последняя)
pub fn advance_screen_fade(time: Res<Time<Fixed>>, mut fade: ResMut<ScreenFade>) {
    fade.tick(time.delta_secs());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_out_then_in() {
        let mut fade = ScreenFade::default();
        fade.fade_out(1.0);
        fade.tick(0.5);
        assert!((fade.alpha - 0.5).abs() < 1e-5);
        fade.tick(0.6);
        assert_eq!(fade.alpha, 1.0);
        assert!(!fade.is_animating());

        fade.fade_in(1.0);
        fade.tick(1.0);
        assert_eq!(fade.alpha, 0.0);
    }

    #[test]
    fn test_zero_duration_is_instant() {
        let mut fade = ScreenFade::default();
        fade.fade_out(0.0);
        assert_eq!(fade.alpha, 1.0);
    }
}
