//! 抽题服务 - 业务能力层
//!
//! 按抽题计划从题库中为一个考生抽题并打乱顺序。

use crate::models::plan::QuizPlan;
use crate::models::question::{QuestionBank, QuestionBlock};
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// 为一个考生抽题
///
/// 1. 用主种子播种，按计划顺序依次为每个专题无放回抽取 `min(count, 可用数)` 道题
/// 2. 各专题结果按顺序拼接
/// 3. 用主种子重新播种后整体打乱
///
/// 第二次播种让最终顺序只取决于主种子和抽中的题目，与抽样消耗了多少随机数无关。
/// 计划中题库不存在的专题不贡献题目。
pub fn select_questions(
    plan: &QuizPlan,
    bank: &QuestionBank,
    main_seed: u64,
) -> Vec<QuestionBlock> {
    let mut rng = ChaCha8Rng::seed_from_u64(main_seed);
    let mut selected = Vec::with_capacity(plan.requested());

    for quota in plan.quotas() {
        let Some(questions) = bank.topic(&quota.name) else {
            debug!("专题 {} 不在题库中，跳过", quota.name);
            continue;
        };

        let amount = quota.count.min(questions.len());
        let picked = index::sample(&mut rng, questions.len(), amount);
        selected.extend(picked.into_iter().map(|i| questions[i].clone()));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(main_seed);
    selected.shuffle(&mut rng);
    selected
}
