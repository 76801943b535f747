pub(crate) struct CliArgs {
    pub cmd: String,
    pub verbose: bool,
    pub threads: usize,
    pub items: usize,
}

pub(crate) fn usage() -> &'static str {
    "Usage: orb <demo|stress|info> [--verbose] [--threads <n>] [--items <n>]"
}

pub(crate) fn parse_args() -> Result<CliArgs, String> {
    parse_from(std::env::args().skip(1).collect())
}

fn parse_from(mut argv: Vec<String>) -> Result<CliArgs, String> {
    if argv.is_empty() {
        return Err(usage().to_string());
    }
    let cmd = argv.remove(0);

    let mut verbose = false;
    let mut threads = 4;
    let mut items = 1000;

    let mut i = 0;
    while i < argv.len() {
        let a = argv[i].as_str();
        match a {
            "--verbose" | "-v" => verbose = true,
            "--threads" | "--items" => {
                let Some(value) = argv.get(i + 1) else {
                    return Err(format!("Missing value for {a}"));
                };
                let n = value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("Invalid value for {a}: {value}"))?;
                if a == "--threads" {
                    threads = n;
                } else {
                    items = n;
                }
                i += 1;
            }
            _ => return Err(format!("Unknown option: {a}")),
        }
        i += 1;
    }

    Ok(CliArgs {
        cmd,
        verbose,
        threads,
        items,
    })
}
