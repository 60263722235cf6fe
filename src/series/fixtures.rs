use once_cell::sync::Lazy;

use super::Point;

// two hours of minutely samples
const TWO_HOURS_START: u32 = 1_440_583_200;
const TWO_HOURS_VALUES: [u16; 120] = [
    761, 727, 765, 706, 700, 679, 757, 708, 739, 707, 699, 740, 729, 766, 730, 715, 705, 693,
    765, 724, 799, 761, 737, 766, 756, 719, 722, 801, 747, 731, 742, 744, 791, 750, 759, 809,
    751, 705, 770, 792, 727, 762, 772, 721, 748, 753, 744, 716, 776, 659, 789, 766, 758, 690,
    795, 770, 758, 723, 767, 765, 693, 706, 681, 727, 724, 780, 678, 696, 758, 740, 735, 700,
    742, 747, 752, 734, 743, 732, 746, 770, 780, 710, 731, 712, 712, 741, 770, 770, 754, 718,
    670, 775, 749, 795, 756, 741, 787, 721, 745, 782, 765, 780, 811, 790, 836, 743, 858, 739,
    762, 770, 752, 763, 795, 792, 746, 786, 785, 774, 786, 718,
];

pub static TWO_HOURS: Lazy<Vec<Point>> = Lazy::new(|| {
    TWO_HOURS_VALUES
        .iter()
        .enumerate()
        .map(|(i, v)| Point {
            t: TWO_HOURS_START + 60 * i as u32,
            v: *v as f64,
        })
        .collect()
});

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
