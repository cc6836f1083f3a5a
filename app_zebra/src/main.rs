use app_zebra::Zebra;
use stripes::JobConfig;

fn main() -> anyhow::Result<()> {
    let config = JobConfig::default().with_input_dir("LEVELS_DIR");
    stripes::run(Zebra, config)
}
