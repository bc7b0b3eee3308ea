use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Migrate the selected tables into the target
    Migrate {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Print the run summary as JSON")]
        json: bool,

        #[arg(
            long,
            help = "If specified, writes the JSON summary to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// List the tables the include/exclude patterns select, without migrating
    Tables {
        #[arg(long, help = "Config file path")]
        config: String,
    },
}
