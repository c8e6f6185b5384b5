//! End-to-end scoring runs through the library API.

use std::io::Write;
use std::path::Path;

use gff_window::commands::ScoreCommand;
use gff_window::config::ScoreConfig;
use gff_window::genome::ReferenceGenome;
use gff_window::scoring::Scheme;
use tempfile::NamedTempFile;

fn create_gff_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file.flush().unwrap();
    file
}

fn score(config: ScoreConfig, input: &Path) -> String {
    let cmd = ScoreCommand::new(config).unwrap();
    let mut out = Vec::new();
    cmd.run(input, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

const METHYLATION: &str = "\
##gff-version 3
chr1\tbs\tCG\t150\t150\t.\t+\t.\tc=1; t=1
chr1\tbs\tCG\t350\t350\t.\t+\t.\tc=1; t=0
chr1\tbs\tCG\t450\t450\t.\t-\t.\tc=5; t=5
chr1\tbs\tCG\t550\t550\t.\t+\t.\tc=0; t=2
chr2\tbs\tCG\t20\t20\t.\t+\t.\tc=3; t=1
";

#[test]
fn test_sliding_windows_cover_each_sequence() {
    let input = create_gff_file(METHYLATION);
    let config = ScoreConfig::new().with_width(200).with_step(200);
    let out = score(config, input.path());

    assert_eq!(
        out,
        "chr1\tdzlab\tw200\t1\t200\t0.5\t.\t.\tc=1; n=1; t=1\n\
         chr1\tdzlab\tw200\t201\t400\t1.0\t.\t.\tc=1; n=1; t=0\n\
         chr1\tdzlab\tw200\t401\t550\t0.4166666666666667\t.\t.\tc=5; n=2; t=7\n\
         chr2\tdzlab\tw200\t1\t20\t0.75\t.\t.\tc=3; n=1; t=1\n"
    );
}

#[test]
fn test_overlapping_windows_share_records() {
    let input = create_gff_file("chr1\ts\tf\t10\t10\t1\t+\t.\t.\nchr1\ts\tf\t30\t30\t1\t+\t.\t.\n");
    let config = ScoreConfig::new()
        .with_width(20)
        .with_step(10)
        .with_scheme(Scheme::Sum)
        .with_reverse(true);
    let out = score(config, input.path());

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3, "got: {}", out);
    assert_eq!(lines[0], "chr1\tdzlab\tw20\t1\t20\t1.0\t.\t.\tn=1.0");
    assert_eq!(lines[1], "chr1\tdzlab\tw20\t11\t30\t1.0\t.\t.\tn=1.0");
    assert_eq!(lines[2], "chr1\tdzlab\tw20\t21\t30\t1.0\t.\t.\tn=1.0");
}

#[test]
fn test_no_skip_reports_empty_windows() {
    let input = create_gff_file(METHYLATION);
    let config = ScoreConfig::new()
        .with_width(100)
        .with_step(100)
        .with_no_skip(true);
    let out = score(config, input.path());

    let chr1: Vec<&str> = out.lines().filter(|l| l.starts_with("chr1\t")).collect();
    assert_eq!(chr1.len(), 6);
    assert_eq!(chr1[0], "chr1\tdzlab\tw100\t1\t100\t.\t.\t.\t.");
    assert!(chr1[1].starts_with("chr1\tdzlab\tw100\t101\t200\t0.5\t"));
    assert_eq!(chr1[5], "chr1\tdzlab\tw100\t501\t550\t0.0\t.\t.\tc=0; n=1; t=2");
}

#[test]
fn test_annotation_merges_transcript_exons() {
    let input = create_gff_file(METHYLATION);
    let annotation = create_gff_file(
        "\
chr1\tTAIR\tgene\t100\t600\t.\t+\t.\tID=GENE1
chr1\tTAIR\texon\t100\t200\t.\t+\t.\tParent=GENE1.1
chr1\tTAIR\texon\t300\t400\t.\t+\t.\tParent=GENE1.1
chr1\tTAIR\texon\t100\t200\t.\t+\t.\tParent=GENE1.2
chr1\tTAIR\texon\t500\t600\t.\t+\t.\tParent=GENE1.2
chr3\tTAIR\texon\t1\t60\t.\t+\t.\tParent=GENE9.1
",
    );
    let config = ScoreConfig::new()
        .with_annotation(annotation.path())
        .with_tag("Parent")
        .with_merge("exon");
    let out = score(config, input.path());

    // 450 lies in an intron and is not counted.
    assert_eq!(
        out,
        "chr1\tdzlab\tlocus\t100\t600\t0.4\t.\t.\tID=GENE1; c=2; n=3; t=3\n"
    );
}

#[test]
fn test_annotation_without_merge_uses_whole_loci() {
    let input = create_gff_file(METHYLATION);
    let annotation = create_gff_file(
        "chr1\tTAIR\tgene\t401\t600\t.\t+\t.\tID=GENE1;Name=one\n\
         chr2\tTAIR\tgene\t1\t10\t.\t+\t.\tID=GENE2\n",
    );
    let config = ScoreConfig::new()
        .with_annotation(annotation.path())
        .with_feature("gene")
        .with_no_skip(true);
    let out = score(config, input.path());

    assert_eq!(
        out,
        "chr1\tdzlab\tgene\t401\t600\t0.4166666666666667\t.\t.\tID=GENE1; c=5; n=2; t=7\n\
         chr2\tdzlab\tgene\t1\t10\t.\t.\t.\tID=GENE2\n"
    );
}

#[test]
fn test_sorted_and_unsorted_search_agree() {
    let content = "\
chr2\ts\tf\t5\t40\t2\t+\t.\t.
chr1\ts\tf\t1\t100\t1\t+\t.\t.
chr1\ts\tf\t20\t25\t3\t+\t.\t.
chr2\ts\tf\t50\t60\t4\t+\t.\t.
chr1\ts\tf\t90\t95\t5\t+\t.\t.
";
    let input = create_gff_file(content);
    for scheme in [Scheme::Sum, Scheme::Average] {
        let base = ScoreConfig::new()
            .with_width(30)
            .with_step(15)
            .with_scheme(scheme)
            .with_no_skip(true);
        let sorted = score(base.clone(), input.path());
        let unsorted = score(base.with_sort(false), input.path());
        assert_eq!(sorted, unsorted, "{} scoring differs", scheme);
        assert!(!sorted.is_empty());
    }
}

#[test]
fn test_runs_are_idempotent() {
    let input = create_gff_file(METHYLATION);
    let config = ScoreConfig::new().with_width(75).with_step(25);
    let first = score(config.clone(), input.path());
    let second = score(config, input.path());
    assert_eq!(first, second);
}

#[test]
fn test_unsorted_input_is_sorted_in_memory() {
    let input = create_gff_file(
        "chr1\ts\tf\t80\t80\t4\t+\t.\t.\nchr1\ts\tf\t10\t10\t2\t+\t.\t.\nchr1\ts\tf\t20\t20\t6\t+\t.\t.\n",
    );
    let config = ScoreConfig::new().with_scheme(Scheme::Average);
    let out = score(config, input.path());

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("chr1\tdzlab\tw50\t1\t50\t4.0\t.\t.\tn=2; std="));
    assert!(lines[0].ends_with("var=8.0"));
    assert_eq!(lines[1], "chr1\tdzlab\tw50\t51\t80\t4.0\t.\t.\tn=1");
}

#[test]
fn test_sequence_frequency() {
    let input = create_gff_file(
        "chr1\ts\tf\t5\t5\t.\t+\t.\tseq=AC\nchr1\ts\tf\t10\t10\t.\t+\t.\tseq=AG\n",
    );
    let config = ScoreConfig::new().with_scheme(Scheme::SequenceFrequency);
    let out = score(config, input.path());
    assert_eq!(
        out,
        "chr1\tdzlab\tw50\t1\t10\t.\t.\t.\ta=1.0,0.0; c=0.0,0.5; g=0.0,0.5; n=2; t=0.0,0.0\n"
    );
}

#[test]
fn test_reference_lengths_bound_windows() {
    let input = create_gff_file("ChrC\ts\tf\t100\t100\t1\t+\t.\t.\n");
    let config = ScoreConfig::new()
        .with_width(100_000)
        .with_step(100_000)
        .with_scheme(Scheme::Sum)
        .with_no_skip(true)
        .with_lengths(ReferenceGenome::Arabidopsis.table());
    let out = score(config, input.path());
    assert_eq!(
        out,
        "chrc\tdzlab\tw100000\t1\t100000\t1.0\t.\t.\tn=1\n\
         chrc\tdzlab\tw100000\t100001\t154478\t.\t.\t.\t.\n"
    );
}

#[test]
fn test_malformed_lines_are_skipped() {
    let input = create_gff_file(
        "chr1\ts\tf\t10\t10\t2\t+\t.\t.\n\
         chr1\ts\tf\t20\n\
         chr1\ts\tf\tx\t30\t2\t+\t.\t.\n\
         chr1\ts\tf\t40\t40\t3\t+\t.\t.\n",
    );
    let config = ScoreConfig::new().with_scheme(Scheme::Sum);
    let out = score(config, input.path());
    assert_eq!(out, "chr1\tdzlab\tw50\t1\t40\t5.0\t.\t.\tn=2\n");
}

#[test]
fn test_missing_input_is_an_error() {
    let cmd = ScoreCommand::new(ScoreConfig::new()).unwrap();
    let err = cmd
        .run("/nonexistent/reads.gff", Vec::new())
        .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/reads.gff"));
}
