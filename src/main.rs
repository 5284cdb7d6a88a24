use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use varda::binning::BinningScheme;
use varda::ingest::digest_path;
use varda::variant::{
    normalize_variant, parse_gt, read_genotype, ChromosomeAliases, GenomicInterval,
    GenotypeFields,
};
use varda::CoreConfig;

#[derive(Parser, Debug)]
#[command(name = "varda", about = "Variant normalization, binning and frequency core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the bin of a region and every bin that may hold overlapping regions.
    Bins {
        /// First position (1-based, or 0-based with --half-open).
        begin: u32,
        /// Last position (inclusive, or exclusive with --half-open).
        end: u32,
        /// Read coordinates as 0-based half-open (BED style).
        #[arg(long)]
        half_open: bool,
        /// Use the six-level scheme for positions beyond 2^29.
        #[arg(long)]
        extended: bool,
    },
    /// Print the canonical form of a variant.
    Normalize {
        /// Chromosome name.
        chromosome: String,
        /// Position (1-based).
        position: u32,
        /// Reference sequence (`-` for none).
        reference: String,
        /// Observed sequence (`-` for none).
        observed: String,
        /// Reference genome (FASTA). Without it only trimming is done.
        #[arg(long)]
        genome: Option<PathBuf>,
        /// Group of interchangeable chromosome names, comma separated.
        #[arg(long = "alias")]
        aliases: Vec<String>,
    },
    /// Decode the most likely genotype of a call.
    Genotype {
        /// Number of alternate alleles in the record.
        #[arg(long, default_value_t = 1)]
        alt_count: usize,
        /// GT value, e.g. `0/1`.
        #[arg(long)]
        gt: Option<String>,
        /// Comma-separated PL values.
        #[arg(long)]
        pl: Option<String>,
        /// Comma-separated GL values.
        #[arg(long)]
        gl: Option<String>,
        /// Ploidy hint.
        #[arg(long)]
        ploidy: Option<usize>,
        /// Use likelihoods even when GT is given.
        #[arg(long)]
        prefer_likelihoods: bool,
    },
    /// Checksum and line count of data source files.
    Digest {
        /// Files to fingerprint.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bins {
            begin,
            end,
            half_open,
            extended,
        } => run_bins(begin, end, half_open, extended)?,
        Commands::Normalize {
            chromosome,
            position,
            reference,
            observed,
            genome,
            aliases,
        } => run_normalize(&chromosome, position, &reference, &observed, genome, &aliases)?,
        Commands::Genotype {
            alt_count,
            gt,
            pl,
            gl,
            ploidy,
            prefer_likelihoods,
        } => run_genotype(alt_count, gt, pl, gl, ploidy, prefer_likelihoods)?,
        Commands::Digest { paths } => run_digest(&paths)?,
    }

    Ok(())
}

fn run_bins(begin: u32, end: u32, half_open: bool, extended: bool) -> Result<()> {
    let scheme = if extended {
        BinningScheme::EXTENDED
    } else {
        BinningScheme::UCSC
    };
    let config = CoreConfig::default().with_binning(scheme);

    let interval = if half_open {
        GenomicInterval::from_half_open("-", begin, end)
    } else {
        GenomicInterval::new("-", begin, end)
    }
    .context("invalid region")?;

    let bin = config.binning.assign_bin(interval.begin(), interval.end())?;
    let overlapping = config.binning.all_bins(interval.begin(), interval.end())?;
    let (first, last) = config.binning.covered_region(bin)?;

    println!("region\t{}-{}", interval.begin(), interval.end());
    println!("bin\t{bin}\t{first}-{last}");
    println!(
        "overlapping\t{}",
        overlapping
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",")
    );
    Ok(())
}

fn run_normalize(
    chromosome: &str,
    position: u32,
    reference: &str,
    observed: &str,
    genome_path: Option<PathBuf>,
    alias_groups: &[String],
) -> Result<()> {
    let mut config = CoreConfig::default();
    if !alias_groups.is_empty() {
        let mut aliases = ChromosomeAliases::default();
        for group in alias_groups {
            aliases.push_group(group.split(',').map(str::trim).filter(|name| !name.is_empty()));
        }
        config = config.with_chromosome_aliases(aliases);
    }
    if let Some(path) = genome_path {
        config = config.with_reference_genome(path);
    }

    let genome = config.load_genome().context("failed to load reference genome")?;
    if let Some(genome) = &genome {
        info!(chromosomes = genome.len(), "loaded reference genome");
    }
    let ctx = config.context(genome.as_ref());

    let variant = normalize_variant(
        &ctx,
        chromosome,
        position,
        dash_to_empty(reference),
        dash_to_empty(observed),
    )
    .with_context(|| format!("cannot normalize {chromosome}:{position} {reference}>{observed}"))?;

    println!(
        "{}\t{}\t{}\t{}\tbin={}",
        variant.chromosome,
        variant.position,
        empty_to_dash(&variant.reference),
        empty_to_dash(&variant.observed),
        variant.bin()?
    );
    Ok(())
}

fn run_genotype(
    alt_count: usize,
    gt: Option<String>,
    pl: Option<String>,
    gl: Option<String>,
    ploidy: Option<usize>,
    prefer_likelihoods: bool,
) -> Result<()> {
    let mut fields = GenotypeFields::default();
    if let Some(gt) = gt {
        fields = fields.with_gt(parse_gt(&gt)?);
    }
    if let Some(pl) = pl {
        fields = fields.with_pl(parse_list(&pl, "PL")?);
    }
    if let Some(gl) = gl {
        fields = fields.with_gl(parse_list(&gl, "GL")?);
    }
    if let Some(ploidy) = ploidy {
        fields = fields.with_ploidy(ploidy);
    }

    match read_genotype(&fields, alt_count, prefer_likelihoods)? {
        Some(genotype) => println!("{genotype}"),
        None => println!("."),
    }
    Ok(())
}

fn run_digest(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let digest = digest_path(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        println!("{}\t{}\t{}", digest.checksum, digest.records, path.display());
    }
    Ok(())
}

fn parse_list<T: FromStr>(value: &str, field: &str) -> Result<Vec<T>> {
    value
        .split(',')
        .map(|item| {
            let item = item.trim();
            match item.parse() {
                Ok(parsed) => Ok(parsed),
                Err(_) => bail!("invalid {field} value '{item}'"),
            }
        })
        .collect()
}

fn dash_to_empty(sequence: &str) -> &str {
    if sequence == "-" {
        ""
    } else {
        sequence
    }
}

fn empty_to_dash(sequence: &str) -> &str {
    if sequence.is_empty() {
        "-"
    } else {
        sequence
    }
}
