#[cfg(test)]
mod tests {
    use honey_core::Observable;

    use crate::*;

    #[test]
    fn test_measure_records_cascade() {
        let mut hud = Hud::new();
        let a = Observable::new(1);
        let b = Observable::computed({
            let a = a.clone();
            move || a.get() + 1
        });

        let changed = hud.measure("a=2", || a.set(2));
        assert!(changed);
        assert_eq!(b.get(), 3);

        let m = hud.metrics.as_ref().unwrap();
        assert_eq!(m.label, "a=2");
        assert_eq!(m.delta.writes, 2);
        assert_eq!(m.delta.recomputes, 1);
        assert_eq!(m.delta.notifications, 1);
        assert_eq!(hud.cascade_count(), 1);

        hud.measure("a=2 again", || a.set(2));
        let m = hud.metrics.as_ref().unwrap();
        assert_eq!(m.delta.writes, 0);
        assert_eq!(m.delta.suppressed_writes, 1);
    }

    #[test]
    fn test_report_only_when_enabled() {
        let mut inspector = Inspector::new();
        assert!(inspector.report().is_none());
        inspector.hud.toggle();
        let report = inspector.report().unwrap();
        assert!(report.contains("cascades: 0"));
    }

    #[test]
    fn test_graph_dot() {
        let price = Observable::new(10).named("price");
        let total = Observable::computed({
            let price = price.clone();
            move || price.get() * 2
        })
        .named("total");

        let dot = Inspector::graph_dot(&[total.as_any()]);
        assert!(dot.starts_with("digraph honey {"));
        assert!(dot.contains("label=\"total\" shape=box"));
        assert!(dot.contains("label=\"price\" shape=ellipse"));
        assert!(dot.contains(&format!(
            "n{} -> n{};",
            price.id().get(),
            total.id().get()
        )));
    }
}
