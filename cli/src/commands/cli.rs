use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "faultd", version, about = "Per-node fault injection agent")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format for inject/query results.
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a fault to a target.
    Inject(InjectArgs),
    /// Reverse an experiment by id.
    Recover(RecoverArgs),
    /// Show persisted experiments.
    Query(QueryArgs),
}

#[derive(ClapArgs, Debug)]
pub struct InjectArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub target: TargetCommand,
}

/// Flags shared by every inject target.
#[derive(ClapArgs, Debug, Clone)]
pub struct CommonArgs {
    /// Container runtime kind; empty targets the host directly.
    #[arg(long, default_value = "")]
    pub container_runtime: String,

    #[arg(long, default_value = "")]
    pub container_id: String,

    /// Experiment duration, e.g. "30s", "2m". Empty means no self-expiry;
    /// the scheduler is expected to call recover explicitly.
    #[arg(long, short = 't', default_value = "")]
    pub timeout: String,

    /// Experiment id; generated when omitted.
    #[arg(long)]
    pub uid: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum TargetCommand {
    /// Faults against a running JVM process.
    Jvm {
        #[command(subcommand)]
        fault: JvmFault,
    },
}

#[derive(Subcommand, Debug)]
pub enum JvmFault {
    /// Throw an exception from selected methods of the target process.
    Methodexception(MethodExceptionFlags),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MethodExceptionFlags {
    /// Target process's pid.
    #[arg(long, short = 'p', default_value_t = 0)]
    pub pid: u32,

    /// Key used to grep for the target process, the effect is equivalent
    /// to "ps -ef | grep [key]". If "pid" is provided, "key" is ignored.
    #[arg(long, short = 'k', default_value = "")]
    pub key: String,

    /// Target methods, format: "class1@method1@msg,class1@method2@msg",
    /// eg: com.test.Client@sayHello@error
    #[arg(long, short = 'm', default_value = "")]
    pub method: String,
}

#[derive(ClapArgs, Debug)]
pub struct RecoverArgs {
    /// Experiment id to recover.
    pub uid: String,
}

#[derive(ClapArgs, Debug)]
pub struct QueryArgs {
    /// Show only this experiment.
    pub uid: Option<String>,
}
