use honey_core::prelude::*;
use honey_devtools::Inspector;
use honey_model::{pack, unpack};
use serde_json::json;

fn print_order(price: &Observable<i64>, quantity: &Observable<i64>, total: &Observable<i64>) {
    println!(
        "price {} x {} = {}",
        price.formatted().unwrap_or_default(),
        quantity.get(),
        total.get()
    );
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let price = Observable::with_format(10i64, "money")?.named("price");
    let quantity = Observable::new(3i64).named("quantity");

    let subtotal = Observable::computed({
        let (price, quantity) = (price.clone(), quantity.clone());
        move || price.get() * quantity.get()
    })
    .named("subtotal");

    let total = Observable::computed({
        let (price, subtotal) = (price.clone(), subtotal.clone());
        move || subtotal.get() + price.get() / 10
    })
    .named("total");

    total.subscribe(|v| log::info!("total is now {v}"));

    let mut inspector = Inspector::new();
    inspector.hud.toggle();

    print_order(&price, &quantity, &total);

    inspector.hud.measure("price <- $25", || price.set_formatted("$25"))?;
    print_order(&price, &quantity, &total);

    inspector.hud.measure("quantity <- 4", || quantity.set(4));
    print_order(&price, &quantity, &total);

    if let Some(report) = inspector.report() {
        println!("{report}");
    }
    print!("{}", Inspector::graph_dot(&[total.as_any()]));

    let order = unpack(&json!({ "customer": "ada", "lines": { "widgets": 2 } }), None)?;
    let widgets = order
        .observable("lines.widgets")
        .ok_or_else(|| anyhow::anyhow!("missing lines.widgets"))?;
    widgets.subscribe(|v| log::info!("widgets changed to {v}"));

    let snapshot = pack(&order);
    let order = unpack(&json!({ "lines": { "widgets": 5 } }), Some(order))?;
    println!("before: {snapshot}");
    println!("after:  {}", order.to_json()?);

    Ok(())
}
