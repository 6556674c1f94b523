use std::env;
use std::fs;

use rs_bnet_core::io::{build_output_path, load_corpus};
use rs_bnet_core::model::alphabet::Alphabet;
use rs_bnet_core::model::generator::{corpus_perplexity, generate_random, train_corpus};
use rs_bnet_core::model::network::CustomNetModel;
use rs_bnet_core::model::ngram_model::NGramModel;
use rs_bnet_core::model::Model;

/// Order of the n-gram baseline (context length 4).
const NGRAM_ORDER: usize = 5;

/// Window length of the belief network.
const WINDOW_LEN: usize = 16;

/// Number of symbols to sample into out.txt after training.
const GENERATED_LEN: usize = 30000;

/// Samples a generation from the trained model and scores the test corpus.
fn evaluate<M: Model>(model: &mut M, test_corpus: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let generated = generate_random(model, GENERATED_LEN);
    fs::write("out.txt", &generated)?;
    println!("Wrote {} generated characters to out.txt", generated.chars().count());

    println!("Scoring {} test examples", test_corpus.len());
    println!("Test perplexity: {:.4}", corpus_perplexity(model, test_corpus));
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Usage: rs-bnet-cli [data_dir] [ngram|net]
    let args: Vec<String> = env::args().collect();
    let data_dir = args.get(1).map(String::as_str).unwrap_or("./data");
    let model_kind = args.get(2).map(String::as_str).unwrap_or("ngram");

    let train_path = format!("{}/train.txt", data_dir);
    let train_data = load_corpus(&train_path)?;
    let test_data = load_corpus(format!("{}/test.txt", data_dir))?;

    // The alphabet is built once from the training corpus; test symbols
    // outside it resolve to the unknown sentinel.
    let alphabet = Alphabet::from_corpus(&train_data);
    println!("Alphabet size: {} ({} examples)", alphabet.size(), train_data.len());

    match model_kind {
        "ngram" => {
            // Reuse the binary cache next to the corpus when present,
            // otherwise train from scratch and write it.
            let cache_path = build_output_path(&train_path, "bin")?;
            let mut model = match NGramModel::from_cache(&cache_path)? {
                Some(model) => {
                    println!("Loaded cached model from {}", cache_path.display());
                    model
                }
                None => {
                    let mut model = NGramModel::new(NGRAM_ORDER, alphabet)?;
                    println!("Training {}-gram model", model.order());
                    train_corpus(&mut model, &train_data);
                    model.save_cache(&cache_path)?;
                    model
                }
            };
            evaluate(&mut model, &test_data)
        }
        "net" => {
            // The network is trained fresh every run: it has no persistence
            // format, its structure is grown online during training.
            let mut model = CustomNetModel::new(WINDOW_LEN, alphabet)?;
            println!("Training belief network, window {}", model.window_len());
            train_corpus(&mut model, &train_data);
            println!("Grew {} combination nodes", model.n_combos());
            evaluate(&mut model, &test_data)
        }
        other => Err(format!("Unknown model kind: {} (expected 'ngram' or 'net')", other).into()),
    }
}
