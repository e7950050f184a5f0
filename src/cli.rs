use std::path::PathBuf;

pub const USAGE: &str = "\
USAGE: swipectl [options]

Options:
\t-c, --conffile FILE : use FILE instead of searching for a configuration
\t-v, --verbose       : log gesture decisions
\t-d, --debug         : log actions instead of running them
\t-r, --raw           : read event lines from standard input
\t-l, --list          : print the configuration and bindings, then exit
\t    --device DEV    : device path, name or \"all\", overrides the configuration
\t-h, --help          : show this help";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub conffile: Option<PathBuf>,
    pub verbose: bool,
    pub dry_run: bool,
    pub raw: bool,
    pub list: bool,
    pub device: Option<String>,
    pub help: bool,
}

impl Options {
    pub fn parse<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut options = Options::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
                _ => (arg, None),
            };
            let mut value = |name: &str| {
                inline
                    .clone()
                    .or_else(|| args.next())
                    .ok_or_else(|| format!("{name} needs a value"))
            };

            match flag.as_str() {
                "-c" | "--conffile" => options.conffile = Some(PathBuf::from(value(&flag)?)),
                "--device" => options.device = Some(value(&flag)?),
                "-v" | "--verbose" => options.verbose = true,
                "-d" | "--debug" => options.dry_run = true,
                "-r" | "--raw" => options.raw = true,
                "-l" | "--list" => options.list = true,
                "-h" | "--help" => options.help = true,
                other => return Err(format!("unknown option '{other}'")),
            }
        }

        Ok(options)
    }
}
