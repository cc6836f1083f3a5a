use app_wordcount::{config, WordCount};

fn main() -> anyhow::Result<()> {
    stripes::run(WordCount::default(), config())
}
