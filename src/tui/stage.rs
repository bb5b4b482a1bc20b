//! Background particles and confetti, drawn behind the current view.
//!
//! Positions are kept in unit coordinates (0.0..1.0 across and down the
//! screen) so resizing the terminal never invalidates them.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;

use crate::effects::EffectCommand;

const AMBIENT_COUNT: usize = 50;
const GOLD: [Color; 4] = [
    Color::Rgb(212, 175, 55),
    Color::Rgb(244, 228, 188),
    Color::Rgb(197, 160, 40),
    Color::Rgb(255, 215, 0),
];
const CONFETTI: [Color; 5] = [
    Color::Rgb(212, 175, 55),
    Color::Rgb(255, 215, 0),
    Color::Rgb(244, 228, 188),
    Color::Rgb(233, 30, 99),
    Color::Rgb(156, 39, 176),
];
const AMBIENT_GLYPHS: [char; 3] = ['·', '•', '∙'];
const CONFETTI_GLYPHS: [char; 5] = ['*', '+', '▪', '✦', '•'];

const SIDE_BURST_DELAY: Duration = Duration::from_millis(300);
const SECOND_BURST_DELAY: Duration = Duration::from_millis(600);
const DRIZZLE_INTERVAL: Duration = Duration::from_millis(800);
/// Longest step simulated at once, so a stalled frame does not teleport pieces
const MAX_STEP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
struct Particle {
    x: f32,
    y: f32,
    speed_x: f32,
    speed_y: f32,
    glyph: char,
    color: Color,
}

#[derive(Debug, Clone)]
struct ConfettiPiece {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    gravity: f32,
    /// Velocity retained per second
    decay: f32,
    ttl: f32,
    glyph: char,
    color: Color,
}

/// Parameters of one confetti shot, loosely following canvas-confetti
#[derive(Debug, Clone, Copy)]
struct Shot {
    count: usize,
    /// Direction in degrees, 90 is straight up
    angle: f32,
    /// Cone width in degrees
    spread: f32,
    origin_x: f32,
    origin_y: f32,
    velocity: f32,
    gravity: f32,
    decay: f32,
}

impl Default for Shot {
    fn default() -> Self {
        Self {
            count: 50,
            angle: 90.0,
            spread: 45.0,
            origin_x: 0.5,
            origin_y: 0.5,
            velocity: 1.0,
            gravity: 1.0,
            decay: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheduled {
    SideBursts,
    CenterBurst,
}

pub struct Stage {
    ambient_enabled: bool,
    particles: Vec<Particle>,
    confetti: Vec<ConfettiPiece>,
    scheduled: Vec<(Instant, Scheduled)>,
    next_drizzle: Option<Instant>,
    last_update: Option<Instant>,
    rng: StdRng,
}

impl Stage {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            ambient_enabled: false,
            particles: Vec::new(),
            confetti: Vec::new(),
            scheduled: Vec::new(),
            next_drizzle: None,
            last_update: None,
            rng,
        }
    }

    pub fn apply(&mut self, command: EffectCommand, now: Instant) {
        match command {
            EffectCommand::AmbientParticles => {
                if !self.ambient_enabled {
                    self.ambient_enabled = true;
                    let mut particles = Vec::with_capacity(AMBIENT_COUNT);
                    for _ in 0..AMBIENT_COUNT {
                        let y = self.rng.gen_range(0.0..1.0);
                        particles.push(self.spawn_particle(y));
                    }
                    self.particles = particles;
                }
            }
            EffectCommand::InvitationBurst => {
                self.fire_center_burst();
                self.scheduled.push((now + SIDE_BURST_DELAY, Scheduled::SideBursts));
                self.scheduled.push((now + SECOND_BURST_DELAY, Scheduled::CenterBurst));
                self.next_drizzle = Some(now + DRIZZLE_INTERVAL);
            }
            EffectCommand::CelebrationBurst => self.fire_celebration(),
            EffectCommand::ClearCelebration => {
                self.confetti.clear();
                self.scheduled.clear();
                self.next_drizzle = None;
            }
        }
    }

    pub fn update(&mut self, now: Instant) {
        let dt = match self.last_update {
            Some(last) => now.saturating_duration_since(last).min(MAX_STEP).as_secs_f32(),
            None => 0.0,
        };
        self.last_update = Some(now);

        let mut due = Vec::new();
        self.scheduled.retain(|(at, what)| {
            if now >= *at {
                due.push(*what);
                false
            } else {
                true
            }
        });
        for what in due {
            match what {
                Scheduled::SideBursts => self.fire_side_bursts(),
                Scheduled::CenterBurst => self.fire_center_burst(),
            }
        }

        if let Some(at) = self.next_drizzle {
            if now >= at {
                self.fire_drizzle();
                self.next_drizzle = Some(now + DRIZZLE_INTERVAL);
            }
        }

        self.step_particles(dt);
        self.step_confetti(dt);
    }

    pub fn confetti_count(&self) -> usize {
        self.confetti.len()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    fn spawn_particle(&mut self, y: f32) -> Particle {
        Particle {
            x: self.rng.gen_range(0.0..1.0),
            y,
            speed_x: self.rng.gen_range(-0.015..0.015),
            speed_y: self.rng.gen_range(0.02..0.07),
            glyph: AMBIENT_GLYPHS[self.rng.gen_range(0..AMBIENT_GLYPHS.len())],
            color: GOLD[self.rng.gen_range(0..GOLD.len())],
        }
    }

    fn step_particles(&mut self, dt: f32) {
        for index in 0..self.particles.len() {
            let particle = &mut self.particles[index];
            particle.y -= particle.speed_y * dt;
            particle.x += particle.speed_x * dt;
            if particle.y < -0.02 {
                let fresh = self.spawn_particle(1.02);
                self.particles[index] = fresh;
            }
        }
    }

    fn step_confetti(&mut self, dt: f32) {
        for piece in &mut self.confetti {
            let keep = piece.decay.powf(dt);
            piece.vx *= keep;
            piece.vy = piece.vy * keep + piece.gravity * dt;
            piece.x += piece.vx * dt;
            piece.y += piece.vy * dt;
            piece.ttl -= dt;
        }
        self.confetti
            .retain(|piece| piece.ttl > 0.0 && piece.y < 1.1 && (-0.1..1.1).contains(&piece.x));
    }

    fn fire(&mut self, shot: Shot) {
        for _ in 0..shot.count {
            let half = shot.spread / 2.0;
            let angle = (shot.angle + self.rng.gen_range(-half..=half)).to_radians();
            let speed = shot.velocity * self.rng.gen_range(0.5..1.0);
            self.confetti.push(ConfettiPiece {
                x: shot.origin_x,
                y: shot.origin_y,
                vx: angle.cos() * speed,
                // Screen y grows downward
                vy: -angle.sin() * speed,
                gravity: shot.gravity,
                decay: shot.decay,
                ttl: self.rng.gen_range(1.5..3.0),
                glyph: CONFETTI_GLYPHS[self.rng.gen_range(0..CONFETTI_GLYPHS.len())],
                color: CONFETTI[self.rng.gen_range(0..CONFETTI.len())],
            });
        }
    }

    fn fire_center_burst(&mut self) {
        self.fire(Shot {
            count: 100,
            spread: 70.0,
            origin_y: 0.6,
            ..Default::default()
        });
    }

    fn fire_side_bursts(&mut self) {
        for (angle, origin_x) in [(60.0, 0.0), (120.0, 1.0)] {
            self.fire(Shot {
                count: 50,
                angle,
                spread: 55.0,
                origin_x,
                origin_y: 0.6,
                ..Default::default()
            });
        }
    }

    fn fire_drizzle(&mut self) {
        let origin_x = self.rng.gen_range(0.0..1.0);
        self.fire(Shot {
            count: 10,
            spread: 120.0,
            origin_x,
            origin_y: 0.1,
            velocity: 0.4,
            gravity: 0.8,
            ..Default::default()
        });
    }

    fn fire_celebration(&mut self) {
        // (count, spread, velocity, decay), 200 pieces in total
        let parts: [(usize, f32, f32, f32); 5] = [
            (50, 26.0, 1.3, 0.9),
            (40, 60.0, 1.0, 0.9),
            (70, 100.0, 1.0, 0.91),
            (20, 120.0, 0.6, 0.92),
            (20, 120.0, 1.0, 0.9),
        ];
        for (count, spread, velocity, decay) in parts {
            self.fire(Shot {
                count,
                spread,
                origin_y: 0.7,
                velocity,
                decay,
                ..Default::default()
            });
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

fn cell_position(area: Rect, x: f32, y: f32) -> Option<(u16, u16)> {
    if !(0.0..1.0).contains(&x) || !(0.0..1.0).contains(&y) {
        return None;
    }
    let column = area.x + (x * area.width as f32) as u16;
    let row = area.y + (y * area.height as f32) as u16;
    (column < area.right() && row < area.bottom()).then_some((column, row))
}

impl Widget for &Stage {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let particles = self
            .particles
            .iter()
            .map(|p| (p.x, p.y, p.glyph, p.color));
        let confetti = self
            .confetti
            .iter()
            .map(|c| (c.x, c.y, c.glyph, c.color));

        for (x, y, glyph, color) in particles.chain(confetti) {
            if let Some((column, row)) = cell_position(area, x, y) {
                if let Some(cell) = buf.cell_mut((column, row)) {
                    cell.set_char(glyph).set_fg(color);
                }
            }
        }
    }
}
