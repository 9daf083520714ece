use std::ffi::OsString;
use std::path::PathBuf;

pub use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Interactive HTTP request shell", long_about = None)]
struct ClapArgs {
    /// Initial URL; `//host`, `://host` and `host` are treated as http
    url: Option<String>,

    /// Client-style items applied after the saved context, like `name=foo Accept:text/html`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    items: Vec<String>,

    /// OpenAPI/Swagger JSON used for `ls`, `cd` completion and the base URL
    #[arg(long, value_name = "FILE")]
    spec: Option<PathBuf>,

    /// Context file to replay instead of the saved one
    #[arg(long, value_name = "FILE")]
    env: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CommandLineArgs {
    url: Option<String>,
    items: Vec<String>,
    spec: Option<PathBuf>,
    env: Option<PathBuf>,
}

impl From<ClapArgs> for CommandLineArgs {
    fn from(args: ClapArgs) -> Self {
        Self {
            url: args.url,
            items: args.items,
            spec: args.spec,
            env: args.env,
        }
    }
}

impl CommandLineArgs {
    pub fn parse() -> Self {
        ClapArgs::parse().into()
    }

    pub fn parse_from<I, T>(itr: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        ClapArgs::parse_from(itr).into()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn spec(&self) -> Option<&PathBuf> {
        self.spec.as_ref()
    }

    pub fn env(&self) -> Option<&PathBuf> {
        self.env.as_ref()
    }
}
