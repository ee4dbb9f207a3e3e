use chrono::Datelike;
use chrono::NaiveDate;
use optiflow::db::entity::Product;
use optiflow::generator::demo_catalog;
use optiflow::generator::seasonal_multiplier;
use optiflow::generator::weekday_multiplier;
use optiflow::generator::Generator;
use optiflow::generator::ProductProfile;
use optiflow::types::RotationProfile;
use statrs::statistics::Statistics;

fn fast_product() -> Product {
    Product {
        id:             42,
        name:           "Cable Organizer".into(),
        reference:      "ACC-CABLE".into(),
        category:       "Accessories".into(),
        list_price:     15.0,
        standard_price: 6.0,
        rotation:       RotationProfile::Fast,
        nominal_stock:  200,
        is_active:      true,
    }
}

fn eleven_months(seed: Option<u64>) -> Generator {
    let (start, end) = Generator::months(2024, 1, 11).unwrap();
    Generator::builder().start(start).end(end).seed(seed).build().unwrap()
}

#[test]
fn fast_product_over_eleven_months() {
    let product = fast_product();
    let profile = ProductProfile::from_product(&product).unwrap();
    let generator = eleven_months(Some(2024));
    let dataset = generator.generate(&[product], &None).unwrap();

    assert!(dataset.sales.len() >= 300, "only {} sales", dataset.sales.len());

    let expected: f64 = dataset
        .stock
        .iter()
        .map(|s| profile.daily_demand() * seasonal_multiplier(s.recorded_on) * weekday_multiplier(s.recorded_on))
        .sum();
    let actual = dataset.units_sold() as f64;
    assert!(
        (actual - expected).abs() / expected < 0.10,
        "sold {actual}, expected about {expected:.0}"
    );
}

#[test]
fn stock_never_negative_and_restocked_under_threshold() {
    let generator = eleven_months(Some(11));
    let catalog = demo_catalog();
    let dataset = generator.generate(&catalog, &None).unwrap();

    for product in &catalog {
        let profile = ProductProfile::from_product(product).unwrap();
        let mut on_hand = profile.target_stock();

        for day in dataset.stock_of(product.id) {
            assert!(day.quantity_on_hand >= 0, "{} negative on {}", product.name, day.recorded_on);
            assert_eq!(day.movement, day.replenished - day.sold);
            assert!(day.sold <= on_hand, "{} oversold on {}", product.name, day.recorded_on);

            let after_sales = on_hand - day.sold;
            if after_sales < profile.reorder_threshold() {
                assert_eq!(day.replenished, profile.target_stock() - after_sales);
            }
            else {
                assert_eq!(day.replenished, 0);
            }

            on_hand += day.movement;
            assert_eq!(day.quantity_on_hand, on_hand);
        }
    }
}

#[test]
fn sales_match_stock_movements() {
    let dataset = eleven_months(Some(3)).generate(&demo_catalog(), &None).unwrap();

    for product in &dataset.products {
        let sold: i64 = dataset.stock_of(product.id).map(|s| s.sold).sum();
        let sales: i64 = dataset.sales_of(product.id).map(|s| s.quantity).sum();
        assert_eq!(sold, sales, "{}", product.name);
    }
    assert!(dataset
        .sales
        .iter()
        .all(|s| dataset.customers.iter().any(|c| c.name == s.customer_name)));
}

fn monthly_units(generator: &Generator) -> Vec<f64> {
    let dataset = generator.generate(&[fast_product()], &None).unwrap();
    let mut months = vec![0.0; 11];
    for sale in &dataset.sales {
        months[sale.sold_on.month0() as usize] += sale.quantity as f64;
    }
    months
}

#[test]
fn reruns_keep_the_seasonal_shape() {
    let first = monthly_units(&eleven_months(None));
    let second = monthly_units(&eleven_months(None));
    assert_ne!(first, second, "unseeded runs should differ");

    for months in [&first, &second] {
        // September outsells the summer months.
        assert!(months[8] > months[6] * 1.8, "{months:?}");
        assert!(months[8] > months[7] * 1.8, "{months:?}");
    }

    let mean_first = first.iter().mean();
    let mean_second = second.iter().mean();
    assert!((mean_first - mean_second).abs() / mean_first < 0.10);
}

#[test]
fn seeded_runs_repeat() {
    let generator = eleven_months(Some(99));
    let a = generator.generate(&demo_catalog(), &None).unwrap();
    let b = generator.generate(&demo_catalog(), &None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn single_day_range() {
    let day = NaiveDate::from_ymd_opt(2024, 9, 16).unwrap();
    let generator = Generator::builder().start(day).end(day).seed(Some(5)).build().unwrap();
    let dataset = generator.generate(&demo_catalog(), &None).unwrap();
    assert_eq!(dataset.stock.len(), demo_catalog().len());
    assert_eq!(dataset.date_range(), Some((day, day)));
}
