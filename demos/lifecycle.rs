/// full offer lifecycle - create, match, extend, repay, and a claim path
use pawnshop_rs::{
    AssetKind, CollateralRef, CreateOfferRequest, FeeScheduleRegistry, InMemoryGateway,
    PawnConfig, PawnShop, SafeTimeProvider, TimeSource, Uuid,
};
use pawnshop_rs::chrono::{Duration, TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== pawn loan lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let usdc = AssetKind::Token("usdc".to_string());
    let mut registry = FeeScheduleRegistry::new();
    registry.set_rates(usdc.clone(), 100_000, 20_000); // 10% & 2%

    let mut gateway = InMemoryGateway::new();
    gateway.mint_collateral("alice", "punks", 7, 1);
    gateway.approve_collateral("alice", "punks");
    gateway.mint_fungible("bob", &usdc, 1_000_000_000);
    gateway.mint_fungible("alice", &usdc, 1_000_000_000);

    let mut shop = PawnShop::new(PawnConfig::new("treasury", "admin"), registry, gateway)?;

    // alice posts her NFT for a 7-day, 100 USDC loan
    let offer_id = Uuid::new_v4();
    shop.create_offer(
        "alice",
        CreateOfferRequest {
            id: offer_id,
            collateral: CollateralRef::new("punks", 7, 1),
            destination: "alice".to_string(),
            principal_amount: 100_000_000,
            principal_asset: usdc.clone(),
            borrow_period_secs: 604_800,
            apply_window_start: time.now(),
            apply_window_end: time.now() + Duration::days(3),
            lender_fee_rate: None,
        },
        &time,
    )?;
    println!("offer created on {}", time.now().format("%Y-%m-%d"));

    // bob quotes and funds it on the quoted terms
    let quote = shop.quote_apply_amounts(&offer_id)?;
    println!(
        "quoted: lender fee {}, service fee {}, net to alice {}",
        quote.lender_fee, quote.service_fee, quote.net_to_borrower
    );
    shop.gateway.set_allowance("bob", &usdc, 100_000_000);
    shop.apply_offer("bob", &offer_id, &quote.fingerprint, 100_000_000, None, &time)?;
    println!("matched by bob; due {}", shop.offer(&offer_id)?.end_lending_at.unwrap());

    // alice buys another week
    controller.advance(Duration::days(5));
    let extend = shop.quote_extend_fees(&offer_id, 604_800)?;
    shop.gateway.set_allowance("alice", &usdc, extend.total());
    shop.extend_lending_time("alice", &offer_id, 604_800, None, &time)?;
    println!(
        "\nextended on {}; new due date {}",
        time.now().format("%Y-%m-%d"),
        shop.offer(&offer_id)?.end_lending_at.unwrap()
    );

    // and repays before the new deadline
    controller.advance(Duration::days(8));
    shop.gateway.set_allowance("alice", &usdc, 100_000_000);
    shop.repay("alice", &offer_id, 100_000_000, None, &time)?;
    println!("repaid on {}", time.now().format("%Y-%m-%d"));
    println!(
        "alice holds her NFT again: {}",
        shop.gateway.collateral_balance_of("alice", "punks", 7) == 1
    );

    for event in shop.take_events() {
        println!("event: {:?}", event);
    }

    Ok(())
}
