use std::collections::HashSet;
use std::fmt::Write as _;

use web_time::Instant;

use honey_core::{AnyObservable, EngineStats, stats};

pub mod tests;

/// Rolling view of cascade cost, fed by [`Hud::measure`].
pub struct Hud {
    pub enabled: bool,
    cascade_count: u64,
    cascade_ms_smooth: f32,
    pub metrics: Option<Metrics>,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Hud {
    pub fn new() -> Self {
        Self {
            enabled: false,
            cascade_count: 0,
            cascade_ms_smooth: 0.0,
            metrics: None,
        }
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    pub fn cascade_count(&self) -> u64 {
        self.cascade_count
    }

    /// Runs `f` (typically one write) and records what the engine did
    /// while it ran.
    pub fn measure<R>(&mut self, label: impl Into<String>, f: impl FnOnce() -> R) -> R {
        let before = stats();
        let start = Instant::now();
        let out = f();
        let cascade_ms = start.elapsed().as_secs_f32() * 1000.0;
        let delta = diff(stats(), before);

        self.cascade_count += 1;
        // simple EMA
        let a = 0.2;
        self.cascade_ms_smooth = if self.cascade_count == 1 {
            cascade_ms
        } else {
            (1.0 - a) * self.cascade_ms_smooth + a * cascade_ms
        };

        let label = label.into();
        log::debug!(
            "{label}: {} writes, {} recomputes, {} notifications in {cascade_ms:.3} ms",
            delta.writes,
            delta.recomputes,
            delta.notifications
        );
        self.metrics = Some(Metrics {
            label,
            cascade_ms,
            delta,
        });
        out
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("cascades: {}", self.cascade_count),
            format!("avg: {:.3} ms", self.cascade_ms_smooth),
        ];
        if let Some(m) = &self.metrics {
            lines.push(format!("last: {} ({:.3} ms)", m.label, m.cascade_ms));
            lines.push(format!("writes: {}", m.delta.writes));
            lines.push(format!("suppressed: {}", m.delta.suppressed_writes));
            lines.push(format!("recomputes: {}", m.delta.recomputes));
            lines.push(format!("notifications: {}", m.delta.notifications));
        }
        lines
    }

    pub fn summary(&self) -> String {
        self.lines().join("  |  ")
    }
}

#[derive(Clone, Debug, Default)]
pub struct Metrics {
    pub label: String,
    pub cascade_ms: f32,
    pub delta: EngineStats,
}

fn diff(after: EngineStats, before: EngineStats) -> EngineStats {
    EngineStats {
        writes: after.writes.saturating_sub(before.writes),
        suppressed_writes: after
            .suppressed_writes
            .saturating_sub(before.suppressed_writes),
        notifications: after.notifications.saturating_sub(before.notifications),
        recomputes: after.recomputes.saturating_sub(before.recomputes),
        setups: after.setups.saturating_sub(before.setups),
        prunes: after.prunes.saturating_sub(before.prunes),
    }
}

pub struct Inspector {
    pub hud: Hud,
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self { hud: Hud::new() }
    }

    /// The HUD summary, when enabled.
    pub fn report(&self) -> Option<String> {
        self.hud.enabled.then(|| self.hud.summary())
    }

    /// Graphviz rendering of everything `roots` depend on. Edges point from a
    /// dependency to its dependent; computed cells are boxes, leaves ellipses.
    pub fn graph_dot(roots: &[AnyObservable]) -> String {
        let mut out = String::from("digraph honey {\n");
        let mut seen = HashSet::new();
        let mut stack: Vec<AnyObservable> = roots.iter().rev().cloned().collect();

        while let Some(node) = stack.pop() {
            if !seen.insert(node.id()) {
                continue;
            }
            let name = node.label().unwrap_or_else(|| node.id().to_string());
            let shape = if node.is_computed() { "box" } else { "ellipse" };
            let _ = writeln!(
                out,
                "  n{} [label=\"{}\" shape={shape}];",
                node.id().get(),
                name.replace('"', "\\\"")
            );
            let deps = node.dependencies();
            for dep in &deps {
                let _ = writeln!(out, "  n{} -> n{};", dep.id().get(), node.id().get());
            }
            stack.extend(deps.into_iter().rev());
        }

        out.push_str("}\n");
        out
    }
}
