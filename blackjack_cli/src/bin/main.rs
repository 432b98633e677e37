use blackjack::{KellyBettor, OptimalStrategist, Rule, Shoe};
use blackjack_cli::parse_config_from_file;
use clap::Parser;

const DEFAULT_CONFIG_PATH: &str = "~/.blackjack.yml";

#[derive(Debug, Parser)]
#[command(author, about, long_about = None)]
struct CommandLineArgs {
    /// The path of the rule config file.
    #[arg(short, long, default_value_t = String::from(DEFAULT_CONFIG_PATH))]
    config: String,

    /// Number of remaining cards of each rank (1=Ace .. 13=King), given as
    /// 13 comma-separated counts. Defaults to a fresh shoe of the config's
    /// `shoe_size` decks.
    #[arg(long, value_delimiter = ',')]
    shoe: Option<Vec<u32>>,

    /// The player's two-card hand, given as two ranks (1=Ace .. 13=King).
    #[arg(long, num_args = 2, value_delimiter = ',')]
    hand: Vec<u8>,

    /// The dealer's up-card rank (1=Ace .. 13=King).
    #[arg(long)]
    up_card: u8,

    /// Bankroll used for Kelly bet sizing.
    #[arg(long, default_value_t = 100.0)]
    bankroll: f64,
}

fn resolve_config_path(path: String) -> String {
    if path != DEFAULT_CONFIG_PATH {
        return path;
    }
    let home_dir = home::home_dir().expect("cannot find home directory");
    let config_file_path = home_dir.join(".blackjack.yml");
    if !config_file_path.exists() {
        panic!("config file does not exist: {}", config_file_path.display());
    }
    config_file_path
        .to_str()
        .expect("config path is not valid UTF-8")
        .to_string()
}

fn build_shoe(rule: &Rule, counts: Option<Vec<u32>>) -> Shoe {
    match counts {
        Some(counts) => {
            assert_eq!(counts.len(), 13, "--shoe requires exactly 13 counts, one per rank");
            let mut array = [0u32; 14];
            array[1..=13].copy_from_slice(&counts);
            Shoe::new(array)
        }
        None => Shoe::with_number_of_decks(rule.shoe_size),
    }
}

fn main() {
    let args = CommandLineArgs::parse();
    let config_path = resolve_config_path(args.config);

    let config = parse_config_from_file(&config_path).expect("failed to load config");
    let rule: Rule = config.rule.try_into().expect("invalid rule configuration");

    assert_eq!(args.hand.len(), 2, "--hand requires exactly two cards");
    let (c1, c2) = (args.hand[0], args.hand[1]);
    let (player_total, player_aces) = {
        let mut pt = blackjack::card_value(c1) + blackjack::card_value(c2);
        let mut pa = blackjack::is_ace(c1) as u8 + blackjack::is_ace(c2) as u8;
        while pt > 21 && pa > 0 {
            pt -= 10;
            pa -= 1;
        }
        (pt, pa)
    };
    let dealer_total = blackjack::card_value(args.up_card);

    let shoe = build_shoe(&rule, args.shoe);

    let mut dealt_shoe = shoe;
    dealt_shoe.remove_card(c1);
    dealt_shoe.remove_card(c2);
    dealt_shoe.remove_card(args.up_card);

    let mut strategist = OptimalStrategist::new(&rule);
    let can_split = c1 == c2 || (rule.split_any_equal_value && blackjack::card_value(c1) == blackjack::card_value(c2));
    let should_split = can_split
        && strategist
            .should_split(&mut dealt_shoe, player_total, player_aces, dealer_total)
            .expect("invalid hand for strategist");
    let should_double = !should_split
        && strategist
            .should_double(&mut dealt_shoe, player_total, player_aces, dealer_total)
            .expect("invalid hand for strategist");
    let should_hit = !should_split
        && !should_double
        && strategist
            .should_hit(&mut dealt_shoe, player_total, player_aces, dealer_total)
            .expect("invalid hand for strategist");

    let decision = if should_split {
        "split"
    } else if should_double {
        "double"
    } else if should_hit {
        "hit"
    } else {
        "stand"
    };

    let bettor = KellyBettor::new(&rule);
    let bet = bettor.bet_size(args.bankroll, &shoe);

    println!("recommended action: {decision}");
    println!("recommended bet: {bet:.2}");
}
