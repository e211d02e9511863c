//! Command-line surface for ldig: `--init`, `--learning`, `--shrink`,
//! `--debug`, and a default detection mode (§6).
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use rand::thread_rng;

use ldig::features::FeatureList;
use ldig::model::{self, Model};
use ldig::shrink;
use ldig::{corpus, Scorer, Trainer, TrainerConfig};

#[derive(Parser, Debug)]
#[command(name = "ldig", about = "A short-text language identifier")]
struct Args {
    /// Model directory.
    #[arg(short = 'm', long = "model")]
    model: PathBuf,

    /// Initialize a model from one or more corpus files.
    #[arg(long = "init")]
    init: bool,

    /// Train one epoch over one or more corpus files.
    #[arg(long = "learning")]
    learning: bool,

    /// Remove irrelevant (all-zero) features and recompact the model.
    #[arg(long = "shrink")]
    shrink: bool,

    /// Print a feature-by-feature contribution breakdown for each
    /// trailing argument.
    #[arg(long = "debug")]
    debug: bool,

    /// Lower bound of feature frequency (`--init` only).
    #[arg(long = "ff", default_value_t = ldig::common::DEFAULT_LBFF)]
    ff: u64,

    /// N-gram length upper bound (`--init` only).
    #[arg(short = 'n', default_value_t = ldig::common::DEFAULT_NGRAM_BOUND)]
    ngram_bound: usize,

    /// Max-substring extractor binary (`--init` only).
    #[arg(short = 'x', default_value = "./maxsubst")]
    extractor: PathBuf,

    /// SGD learning rate (`--learning` only).
    #[arg(short = 'e', long = "eta", default_value_t = ldig::common::DEFAULT_ETA)]
    eta: f64,

    /// Cumulative L1 regularization constant; absent disables L1
    /// (`--learning` only).
    #[arg(short = 'r', long = "regularity")]
    reg_const: Option<f64>,

    /// Number of full-regularization sweeps per epoch (`--learning` only).
    #[arg(long = "wr", default_value_t = ldig::common::DEFAULT_N_FULL_REG)]
    n_full_reg: u64,

    /// Confidence threshold below which a detection is reported as
    /// "unknown" (default mode and `--debug`).
    #[arg(long = "threshold", default_value_t = ldig::common::DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Corpus files, or (with `--debug`) free text to classify.
    args: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    if args.init {
        return cmd_init(&args);
    }

    if !model::features_path(&args.model).exists() {
        return Err("features file doesn't exist".into());
    }
    if !model::labels_path(&args.model).exists() {
        return Err("labels file doesn't exist".into());
    }
    if !model::parameters_path(&args.model).exists() {
        return Err("parameters file doesn't exist".into());
    }

    if args.debug {
        cmd_debug(&args)
    } else if args.shrink {
        cmd_shrink(&args)
    } else if args.learning {
        cmd_learning(&args)
    } else {
        cmd_detect(&args)
    }
}

fn cmd_init(args: &Args) -> Result<(), Box<dyn Error>> {
    if args.args.is_empty() {
        return Err("need corpus".into());
    }
    let corpus_paths: Vec<PathBuf> = args.args.iter().map(PathBuf::from).collect();
    let (model, features) = model::init(
        &args.model,
        &corpus_paths,
        args.ff,
        args.ngram_bound,
        &args.extractor,
    )?;
    println!("labels: {}", model.labels.len());
    println!("# of features = {}", features.len());
    Ok(())
}

fn cmd_shrink(args: &Args) -> Result<(), Box<dyn Error>> {
    let features = FeatureList::read_path(&model::features_path(&args.model))?;
    let params = ldig::Parameters::read_path(&model::parameters_path(&args.model))?;
    let before = params.rows();

    let shrunk = shrink::shrink(&features, &params)?;
    println!("# of features : {} => {}", before, shrunk.features.len());

    shrunk.features.write_path(&model::features_path(&args.model))?;
    shrunk.params.write_path(&model::parameters_path(&args.model))?;
    let file = std::fs::File::create(model::doublearray_path(&args.model))?;
    shrunk.da.write(file)?;
    Ok(())
}

fn cmd_debug(args: &Args) -> Result<(), Box<dyn Error>> {
    let model = Model::load(&args.model)?;
    let features = FeatureList::read_path(&model::features_path(&args.model))?;
    let feature_texts: Vec<String> = features.0.iter().map(|e| e.text.clone()).collect();
    let scorer = Scorer::new(&model.da, &model.params, &model.labels).with_threshold(args.threshold);

    for text in &args.args {
        let normalized = ldig::normalize(text);
        let table = scorer.debug_table(&normalized.text, &feature_texts)?;
        println!("orig: '{text}'");
        println!("norm: '{}'", normalized.text);
        println!("id\tfeat\tfreq\t{}", model.labels.as_slice().join("\t"));
        for row in &table.entries {
            let weights: Vec<String> = row.weights.iter().map(|w| format!("{w:.2}")).collect();
            println!("{}\t{}\t{}\t{}", row.id, row.feature, row.count, weights.join("\t"));
        }
        let sums: Vec<String> = table.sum.iter().map(|s| format!("{s:.2}")).collect();
        println!("\t\t\t{}", sums.join("\t"));
        let probs: Vec<String> = table.posterior.iter().map(|p| format!("{:.1}%", p * 100.0)).collect();
        println!("\t\t\t{}", probs.join("\t"));
    }
    Ok(())
}

fn cmd_learning(args: &Args) -> Result<(), Box<dyn Error>> {
    if args.args.is_empty() {
        return Err("need corpus".into());
    }
    let mut model = Model::load(&args.model)?;
    let (records, idlist) = corpus::load_for_training(&args.args, &model.labels)?;

    let mut config = TrainerConfig::new().eta(args.eta).full_reg_count(args.n_full_reg);
    if let Some(c) = args.reg_const {
        config = config.regularization(c);
    }

    let mut rng = thread_rng();
    let report = {
        let mut trainer = Trainer::new(&model.da, &model.labels, &mut model.params, config);
        trainer.train_epoch(&records, &idlist, &mut rng)?
    };

    for (label, correct, total) in &report.per_label {
        if *total > 0 {
            println!(
                ">    {} = {} / {} = {:.2}",
                label,
                correct,
                total,
                100.0 * (*correct as f64) / (*total as f64)
            );
        }
    }
    println!(
        "> total = {} / {} = {:.2}",
        report.total_correct,
        report.total,
        100.0 * report.total_correct as f64 / report.total.max(1) as f64
    );
    println!("> # of relevant features = {} / {}", report.relevant_features, model.params.rows());

    model.params.write_path(&model::parameters_path(&args.model))?;
    Ok(())
}

fn cmd_detect(args: &Args) -> Result<(), Box<dyn Error>> {
    let model = Model::load(&args.model)?;
    let scorer = Scorer::new(&model.da, &model.params, &model.labels).with_threshold(args.threshold);
    let records = corpus::load_for_detection(&args.args, &model.labels)?;

    let k = model.labels.len();
    let mut correct = vec![0u64; k];
    let mut total = vec![0u64; k];
    let mut log_likely = 0.0f64;
    let mut n_available = 0u64;

    for record in &records {
        let prediction = scorer.predict(&record.text)?;
        let predicted_label = prediction.label.as_deref().unwrap_or("");

        if let Some(label_idx) = record.label_idx {
            let nll = scorer.nll(&record.text, label_idx)?;
            log_likely += nll;
            n_available += 1;
            total[label_idx] += 1;
            if prediction.predicted_idx == label_idx {
                correct[label_idx] += 1;
            }
        }
        println!("{}\t{}\t{}", record.label, predicted_label, record.original);
    }

    if n_available > 0 {
        log_likely /= n_available as f64;
        for (i, label) in model.labels.as_slice().iter().enumerate() {
            if total[i] > 0 {
                println!(
                    ">    {} = {} / {} = {:.2}",
                    label,
                    correct[i],
                    total[i],
                    100.0 * correct[i] as f64 / total[i] as f64
                );
            }
        }
        let total_correct: u64 = correct.iter().sum();
        println!(
            "> total = {} / {} = {:.2}",
            total_correct,
            n_available,
            100.0 * total_correct as f64 / n_available as f64
        );
        println!("> average negative log likelihood = {log_likely:.3}");
    }
    Ok(())
}
