//! hstrat CLI — inspect retention policies and exercise columns from the shell
//!
//! Commands:
//!   hstrat ranks   — list the ranks a policy retains
//!   hstrat bounds  — show a policy's size and resolution guarantees
//!   hstrat twin    — grow two lineages from a shared ancestor and compare them
//!   hstrat pack    — grow a column and print its serialized forms

use std::env;
use std::error::Error;
use std::process;

use hstrat_core::inference::{estimate_rank_of_mrca_between, BuiltinPrior, Estimator};
use hstrat_core::juxtaposition::{
    calc_rank_of_first_retained_disparity_between, calc_rank_of_last_retained_commonality_between,
    calc_rank_of_mrca_bounds_between,
};
use hstrat_core::serialization::{col_to_int, col_to_packet, col_to_records, PacketConfig};
use hstrat_core::{ColumnConfig, HereditaryStratigraphicColumn, StratumRetentionPolicy};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

type CmdResult = Result<(), Box<dyn Error>>;

fn print_usage() {
    println!(
        r#"
hstrat — hereditary stratigraphy toolkit

Usage: hstrat <command> [options]

Commands:
  ranks   <policy> <n>                                     Retained ranks after n depositions
  bounds  <policy> <n>                                     Retained-count and MRCA bounds
  twin    <policy> <bit-width> <shared> <diverged> [seed]  Compare lineages with a known MRCA
  pack    <policy> <bit-width> <generations> [seed]        Print packet, integer and record forms
  help                                                     Show this message

Policies:
  perfect_resolution
  nominal_resolution
  fixed_resolution(resolution=10)
  depth_proportional_resolution(resolution=10)
  depth_proportional_resolution_tapered(resolution=10)
  recency_proportional_resolution(resolution=4)
  recency_proportional_resolution_curbed(size_curb=20)
  geom_seq_nth_root(degree=2, interspersal=2)
  geom_seq_nth_root_tapered(degree=2, interspersal=2)
  stochastic

Examples:
  hstrat ranks 'recency_proportional_resolution(resolution=2)' 1000
  hstrat twin perfect_resolution 64 10 5
  hstrat pack 'fixed_resolution(resolution=4)' 3 50 7
"#
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let result = match args[1].as_str() {
        "ranks" => cmd_ranks(&args[2..]),
        "bounds" => cmd_bounds(&args[2..]),
        "twin" => cmd_twin(&args[2..]),
        "pack" => cmd_pack(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => Err(format!("Unknown command: {}", other).into()),
    };

    if let Err(e) = result {
        eprintln!("  Error: {}", e);
        process::exit(2);
    }
}

fn require_args(args: &[String], count: usize, usage: &str) -> CmdResult {
    if args.len() < count {
        return Err(format!("Usage: hstrat {}", usage).into());
    }
    Ok(())
}

fn seeded(args: &[String], index: usize) -> Result<StdRng, Box<dyn Error>> {
    let seed: u64 = match args.get(index) {
        Some(raw) => raw.parse()?,
        None => 1,
    };
    Ok(StdRng::seed_from_u64(seed))
}

fn grow(
    policy: StratumRetentionPolicy,
    bit_width: u32,
    generations: u64,
    rng: &mut StdRng,
) -> Result<HereditaryStratigraphicColumn, Box<dyn Error>> {
    let config = ColumnConfig::new(policy, bit_width);
    let mut column = HereditaryStratigraphicColumn::with_config_and_rng(config, rng)?;
    column.deposit_strata_with_rng(rng, generations);
    Ok(column)
}

fn cmd_ranks(args: &[String]) -> CmdResult {
    require_args(args, 2, "ranks <policy> <n>")?;
    let policy: StratumRetentionPolicy = args[0].parse()?;
    let n: u64 = args[1].parse()?;
    let ranks: Vec<u64> = policy
        .iter_retained_ranks(n)
        .ok_or_else(|| {
            format!("{} cannot list retained ranks without a deposition history", policy)
        })?
        .collect();
    println!("  {} after {} depositions ({} retained):", policy, n, ranks.len());
    println!("  {:?}", ranks);
    Ok(())
}

fn cmd_bounds(args: &[String]) -> CmdResult {
    require_args(args, 2, "bounds <policy> <n>")?;
    let policy: StratumRetentionPolicy = args[0].parse()?;
    let n: u64 = args[1].parse()?;
    let mrca = n / 2;
    println!("  Policy:                      {}", policy);
    println!("  Depositions:                 {}", n);
    println!("  Retained (upper bound):      {}", policy.calc_num_strata_retained_upper_bound(n));
    match policy.calc_num_strata_retained_exact(n) {
        Some(exact) => println!("  Retained (exact):            {}", exact),
        None => println!("  Retained (exact):            unavailable"),
    }
    println!(
        "  MRCA uncertainty at rank {}: <= {} (relative {:.3})",
        mrca,
        policy.calc_mrca_uncertainty_abs_upper_bound(n, n, mrca),
        policy.calc_mrca_uncertainty_rel_upper_bound(n, n, mrca)
    );
    if let Some(exact) = policy.calc_mrca_uncertainty_abs_exact(n, n, mrca) {
        println!("  MRCA uncertainty (exact):    {}", exact);
    }
    Ok(())
}

fn cmd_twin(args: &[String]) -> CmdResult {
    require_args(args, 4, "twin <policy> <bit-width> <shared> <diverged> [seed]")?;
    let policy: StratumRetentionPolicy = args[0].parse()?;
    let bit_width: u32 = args[1].parse()?;
    let shared: u64 = args[2].parse()?;
    let diverged: u64 = args[3].parse()?;
    let mut rng = seeded(args, 4)?;

    let ancestor = grow(policy, bit_width, shared, &mut rng)?;
    let left = ancestor.clone_nth_descendant_with_rng(&mut rng, diverged);
    let right = ancestor.clone_nth_descendant_with_rng(&mut rng, diverged);
    info!("Grew twin lineages: mrca rank {}, {} generations apart", shared, diverged);

    println!("  True MRCA rank:              {}", shared);
    println!(
        "  Last commonality (95%):      {:?}",
        calc_rank_of_last_retained_commonality_between(&left, &right, 0.95)
    );
    println!(
        "  First disparity (95%):       {:?}",
        calc_rank_of_first_retained_disparity_between(&left, &right, 0.95)
    );
    println!(
        "  MRCA bounds (95%):           {:?}",
        calc_rank_of_mrca_bounds_between(&left, &right, 0.95)
    );
    let priors = [
        BuiltinPrior::Arbitrary,
        BuiltinPrior::Uniform,
        BuiltinPrior::Geometric { growth_factor: 1.1 },
    ];
    for estimator in [Estimator::MaximumLikelihood, Estimator::Unbiased] {
        for prior in priors {
            let label = format!("{:<20} {:<32}", estimator.to_string(), prior.to_string());
            match estimate_rank_of_mrca_between(&left, &right, estimator, &prior) {
                Some(estimate) => println!("  {} {:.2}", label, estimate),
                None => println!("  {} no common ancestor detected", label),
            }
        }
    }
    Ok(())
}

fn cmd_pack(args: &[String]) -> CmdResult {
    require_args(args, 3, "pack <policy> <bit-width> <generations> [seed]")?;
    let policy: StratumRetentionPolicy = args[0].parse()?;
    let bit_width: u32 = args[1].parse()?;
    let generations: u64 = args[2].parse()?;
    let mut rng = seeded(args, 3)?;

    let column = grow(policy, bit_width, generations, &mut rng)?;
    let config = PacketConfig::default();
    println!(
        "  Column: {} strata retained of {} deposited",
        column.num_strata_retained(),
        column.num_strata_deposited()
    );
    println!("  Packet:  {}", hex::encode(col_to_packet(&column, &config)?));
    println!("  Integer: {}", col_to_int(&column, &config)?);
    println!("  Records: {}", col_to_records(&column).to_json()?);
    Ok(())
}
